//! End-to-end compilation units against the in-memory provider and
//! repository.

use std::collections::HashMap;
use std::path::PathBuf;

use mofc_core::{
    compile, compile_with_provider, CompilationResult, CompileError, CompileOptions, ErrorKind,
    InMemoryProvider, ReincludePolicy, SourceRef,
};
use mofc_repository::{InMemoryRepository, Repository};
use mofc_schema::{CimType, CimValue};

const QUALIFIERS: &str = r#"
qualifier Key : boolean = false, Scope(property, reference), Flavor(DisableOverride, ToSubclass);
qualifier Description : string = null, Scope(any), Flavor(EnableOverride, ToSubclass, Translatable);
qualifier Association : boolean = false, Scope(association), Flavor(DisableOverride, ToSubclass);
qualifier MaxLen : uint32 = null, Scope(property, method, parameter), Flavor(EnableOverride);
qualifier Units : string = null, Scope(property, method, parameter), Flavor(DisableOverride);
qualifier Abstract : boolean = false, Scope(class, association, indication), Flavor(Restricted);
qualifier ValueMap : string[] = null, Scope(property, method, parameter);
"#;

fn buffer(text: &str) -> SourceRef {
    SourceRef::Buffer {
        name: "test.mof".into(),
        text: text.into(),
    }
}

fn with_qualifiers(body: &str) -> SourceRef {
    buffer(&format!("{}\n{}", QUALIFIERS, body))
}

fn unit(repo: &InMemoryRepository, source: SourceRef) -> Result<CompilationResult, CompileError> {
    compile(source, "root/cimv2", &[], &CompileOptions::default(), repo)
}

fn provider(files: &[(&str, &str)]) -> InMemoryProvider {
    InMemoryProvider::new(
        files
            .iter()
            .map(|(path, text)| (PathBuf::from(path), text.to_string()))
            .collect::<HashMap<_, _>>(),
    )
}

fn file_unit(
    repo: &InMemoryRepository,
    files: &[(&str, &str)],
    main: &str,
    options: &CompileOptions,
) -> Result<CompilationResult, CompileError> {
    compile_with_provider(
        SourceRef::File(PathBuf::from(main)),
        "root/cimv2",
        &[PathBuf::from("/lib")],
        options,
        repo,
        &provider(files),
    )
}

// ──────────────────────────────────────────────
// Round trip
// ──────────────────────────────────────────────

#[test]
fn rendered_mof_recompiles_to_identical_classes() {
    let schema = r#"
        [Abstract, Description("Base of everything")]
        class CIM_ManagedElement {
            [Key, MaxLen(64)] string InstanceID;
            [Description("Human readable") : Translatable] string Caption = "none";
            uint16 Codes[] = {1, 2, 0x10};
            real64 Ratio = 0.5;
            datetime Installed = "20240101120000.000000+000";
            char16 Flag = 'y';
            [ValueMap {"0", "1"}] uint32 Reset([Units("seconds")] uint32 Timeout, string Reasons[]);
        };

        class CIM_LogicalElement : CIM_ManagedElement {
            [MaxLen(128)] string InstanceID;
            sint64 Offset = -7;
            boolean Enabled = true;
        };

        [Association]
        class CIM_Dependency {
            [Key] CIM_ManagedElement REF Antecedent;
            [Key] CIM_ManagedElement REF Dependent;
        };

        [Association]
        class CIM_LogicalDependency : CIM_Dependency {
            [Key] CIM_LogicalElement REF Dependent;
        };
    "#;
    let repo = InMemoryRepository::new();
    let first = unit(&repo, with_qualifiers(schema)).unwrap();
    assert_eq!(first.defined_classes.len(), 4);

    let mut text = String::new();
    for q in &first.defined_qualifiers {
        text.push_str(&q.to_string());
        text.push('\n');
    }
    for c in &first.defined_classes {
        text.push_str(&c.to_string());
        text.push('\n');
    }

    let again = InMemoryRepository::new();
    let second = unit(&again, buffer(&text)).unwrap();
    assert_eq!(second.defined_qualifiers.len(), first.defined_qualifiers.len());
    for (a, b) in first.defined_classes.iter().zip(&second.defined_classes) {
        assert_eq!(a.element, b.element, "class {} differs after round trip", a.name);
    }
}

// ──────────────────────────────────────────────
// Inheritance and overrides
// ──────────────────────────────────────────────

const BASE: &str = r#"
    class CIM_Base {
        [Key] string Id;
        [Units("bytes")] uint64 Size;
        [MaxLen(10)] string Name;
    };
"#;

#[test]
fn disable_override_qualifier_value_cannot_change() {
    let repo = InMemoryRepository::new();
    unit(&repo, with_qualifiers(BASE)).unwrap();

    let err = unit(
        &repo,
        buffer("class CIM_Sub : CIM_Base { [Units(\"bits\")] uint64 Size; };"),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.element.as_deref(), Some("CIM_Sub"));
    assert_eq!(err.member.as_deref(), Some("Size"));
    assert!(err.message.contains("DisableOverride"), "{}", err);
    assert!(repo.lookup_class("root/cimv2", "CIM_Sub").is_err());
}

#[test]
fn enable_override_qualifier_value_may_change() {
    let repo = InMemoryRepository::new();
    unit(&repo, with_qualifiers(BASE)).unwrap();

    let result = unit(
        &repo,
        buffer("class CIM_Sub : CIM_Base { [MaxLen(20)] string Name; };"),
    )
    .unwrap();
    let sub = result.class("CIM_Sub").unwrap();
    let name = sub.property("Name").unwrap();
    assert_eq!(
        name.qualifier("MaxLen").unwrap().value,
        Some(CimValue::UInt(20))
    );
    assert_eq!(name.class_origin, "CIM_Sub");
    assert!(sub.property("Size").unwrap().propagated);
}

#[test]
fn override_with_a_different_type_fails() {
    let repo = InMemoryRepository::new();
    unit(&repo, with_qualifiers(BASE)).unwrap();

    for body in [
        "class CIM_Sub : CIM_Base { [MaxLen(20)] uint32 Name; };",
        "class CIM_Sub : CIM_Base { string Name[]; };",
        "class CIM_Sub : CIM_Base { uint32 Size; };",
    ] {
        let err = unit(&repo, buffer(body)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic, "{}", body);
        assert!(err.message.contains("changes the type"), "{}", err);
    }
}

#[test]
fn superclass_lookup_ignores_case() {
    let repo = InMemoryRepository::new();
    let result = unit(
        &repo,
        buffer("class Foo { string A; }; class Bar : FOO { string B; };"),
    )
    .unwrap();
    let bar = result.class("bar").unwrap();
    assert_eq!(bar.superclass.as_deref(), Some("Foo"));
    assert_eq!(bar.properties.len(), 2);
}

#[test]
fn property_is_covered_by_enclosing_class_scope() {
    let repo = InMemoryRepository::new();
    let result = unit(
        &repo,
        buffer(
            r#"qualifier Description : string = null, Scope(class);
               class CIM_Base { };
               class CIM_Sub : CIM_Base { [Description("x")] string Name; };"#,
        ),
    )
    .unwrap();
    assert!(result.is_clean());
    assert_eq!(result.defined_classes.len(), 2);
    let name = result.class("CIM_Sub").unwrap().property("Name").unwrap();
    assert_eq!(
        name.qualifier("Description").unwrap().value,
        Some(CimValue::String("x".into()))
    );
}

#[test]
fn strict_scope_rejects_enclosing_kinds() {
    let repo = InMemoryRepository::new();
    let options = CompileOptions {
        strict_scope: true,
        ..CompileOptions::default()
    };
    let err = compile(
        buffer(
            r#"qualifier Description : string = null, Scope(class);
               class CIM_Base { [Description("x")] string Name; };"#,
        ),
        "root/cimv2",
        &[],
        &options,
        &repo,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("not allowed"));
}

// ──────────────────────────────────────────────
// Syntax and error accumulation
// ──────────────────────────────────────────────

#[test]
fn unterminated_class_is_a_syntax_error_and_defines_nothing() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("class Foo { string Name")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(err.message.contains("end of input"), "{}", err);
    assert_eq!(err.line, 1);
    assert!(repo.lookup_class("root/cimv2", "Foo").is_err());
}

#[test]
fn lexical_errors_are_fatal() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("class A { string S = \"open; };")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

const MIXED: &str = r#"
    [Bogus] class A { };
    class B { };
    class C { uint8 Small = 999; };
    class D { };
"#;

#[test]
fn fail_fast_stops_at_the_first_semantic_error() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, with_qualifiers(MIXED)).unwrap_err();
    assert_eq!(err.element.as_deref(), Some("A"));
    assert!(repo.classes("root/cimv2").is_empty());
    // Declarations before the failure stay defined.
    assert!(repo.lookup_qualifier("root/cimv2", "Key").is_ok());
}

#[test]
fn best_effort_accumulates_semantic_errors() {
    let repo = InMemoryRepository::new();
    let options = CompileOptions {
        best_effort: true,
        ..CompileOptions::default()
    };
    let result = compile(with_qualifiers(MIXED), "root/cimv2", &[], &options, &repo).unwrap();
    let failed: Vec<_> = result
        .errors
        .iter()
        .map(|e| e.element.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(failed, vec!["A", "C"]);
    let defined: Vec<&str> = result.defined_classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(defined, vec!["B", "D"]);
}

#[test]
fn conflicting_redefinition_is_a_repository_conflict() {
    let repo = InMemoryRepository::new();
    unit(&repo, buffer("class A { string X; };")).unwrap();
    unit(&repo, buffer("class A { string X; };")).unwrap();
    let err = unit(&repo, buffer("class A { uint32 X; };")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RepositoryConflict);
}

#[test]
fn identical_redeclaration_in_one_unit_defines_once() {
    let repo = InMemoryRepository::new();
    let result = unit(&repo, buffer("class A { string X; }; class A { string X; };")).unwrap();
    assert_eq!(result.defined_classes.len(), 1);
    assert_eq!(repo.classes("root/cimv2").len(), 1);
}

#[test]
fn incompatible_redeclaration_in_one_unit_is_semantic() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("class A { string X; }; class A { uint32 X; };")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.element.as_deref(), Some("A"));
    assert_eq!(repo.classes("root/cimv2").len(), 1);
}

// ──────────────────────────────────────────────
// Rejected classes in best-effort mode
// ──────────────────────────────────────────────

fn best_effort() -> CompileOptions {
    CompileOptions {
        best_effort: true,
        ..CompileOptions::default()
    }
}

fn error_elements(result: &CompilationResult) -> Vec<(&str, ErrorKind)> {
    result
        .errors
        .iter()
        .map(|e| (e.element.as_deref().unwrap_or(""), e.kind))
        .collect()
}

#[test]
fn subclass_of_rejected_class_reports_both_errors() {
    let repo = InMemoryRepository::new();
    let src = "[Undeclared] class X { }; class Y : X { }; class Z { };";
    let result = compile(buffer(src), "root", &[], &best_effort(), &repo).unwrap();
    assert_eq!(
        error_elements(&result),
        vec![("X", ErrorKind::Semantic), ("Y", ErrorKind::Semantic)]
    );
    assert!(result.errors[0].message.contains("'Undeclared' is not declared"));
    assert!(result.errors[1].message.contains("superclass 'X' of class 'Y' was rejected"));
    let defined: Vec<&str> = result.defined_classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(defined, vec!["Z"]);
}

#[test]
fn waiting_dependents_fail_when_their_class_is_rejected() {
    let repo = InMemoryRepository::new();
    let src = r#"
        class W : Y { };
        class Y : X { };
        instance of X { };
        [Undeclared] class X { };
        class Z { };
    "#;
    let result = compile(buffer(src), "root", &[], &best_effort(), &repo).unwrap();
    assert_eq!(
        error_elements(&result),
        vec![
            ("X", ErrorKind::Semantic),
            ("Y", ErrorKind::Semantic),
            ("W", ErrorKind::Semantic),
            ("X", ErrorKind::Semantic),
        ]
    );
    assert!(result.errors[3].message.contains("class 'X' of instance was rejected"));
    assert_eq!(result.defined_classes.len(), 1);
    assert!(result.defined_instances.is_empty());
}

#[test]
fn rejected_class_still_stops_a_fail_fast_unit() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("[Undeclared] class X { }; class Y : X { };")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.element.as_deref(), Some("X"));
}

// ──────────────────────────────────────────────
// Instances and aliases
// ──────────────────────────────────────────────

const LINKS: &str = r#"
    class CIM_Element { [Key] string Id; string Note; };
    [Association] class CIM_Link {
        [Key] CIM_Element REF Left;
        [Key] CIM_Element REF Right;
    };
"#;

#[test]
fn aliases_referenced_before_definition_resolve() {
    let repo = InMemoryRepository::new();
    let result = unit(
        &repo,
        with_qualifiers(&format!(
            "{}{}",
            LINKS,
            r#"
            instance of CIM_Link { Left = $a; Right = $b; };
            instance of CIM_Element as $a { Id = "a"; };
            instance of CIM_Element as $b { Id = "b"; };
            "#
        )),
    )
    .unwrap();

    let link = result.instances_of("CIM_Link").next().unwrap();
    assert_eq!(
        link.property("Left").unwrap().value,
        Some(CimValue::Reference(r#"root/cimv2:CIM_Element.Id="a""#.into()))
    );
    assert_eq!(link.path.keybindings.len(), 2);
    // The link waited for phase two, so it is defined last.
    assert_eq!(result.defined_instances.last().unwrap().class_name, "CIM_Link");
    assert_eq!(repo.instances("root/cimv2").len(), 3);
}

#[test]
fn aliases_referenced_after_definition_resolve() {
    let repo = InMemoryRepository::new();
    let result = unit(
        &repo,
        with_qualifiers(&format!(
            "{}{}",
            LINKS,
            r#"
            instance of CIM_Element as $a { Id = "a"; };
            instance of CIM_Element as $b { Id = "b"; };
            instance of CIM_Link { Left = $a; Right = $b; };
            "#
        )),
    )
    .unwrap();
    let link = result.instances_of("CIM_Link").next().unwrap();
    assert_eq!(
        link.property("Right").unwrap().value,
        Some(CimValue::Reference(r#"root/cimv2:CIM_Element.Id="b""#.into()))
    );
}

#[test]
fn undefined_alias_is_an_incomplete_schema() {
    let repo = InMemoryRepository::new();
    let err = unit(
        &repo,
        with_qualifiers(&format!(
            "{}{}",
            LINKS,
            r#"
            instance of CIM_Element as $a { Id = "a"; };
            instance of CIM_Link { Left = $a; Right = $nobody; };
            "#
        )),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncompleteSchema);
    assert!(err.message.contains("$nobody"), "{}", err);
}

#[test]
fn duplicate_alias_is_rejected() {
    let repo = InMemoryRepository::new();
    let err = unit(
        &repo,
        with_qualifiers(&format!(
            "{}{}",
            LINKS,
            r#"
            instance of CIM_Element as $a { Id = "a"; };
            instance of CIM_Element as $A { Id = "b"; };
            "#
        )),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("already defined"));
}

#[test]
fn instance_of_undefined_class_is_an_incomplete_schema() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("instance of Nowhere { X = 1; };")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncompleteSchema);
    assert_eq!(err.element.as_deref(), Some("Nowhere"));
}

#[test]
fn string_object_paths_are_accepted_for_references() {
    let repo = InMemoryRepository::new();
    let result = unit(
        &repo,
        with_qualifiers(&format!(
            "{}{}",
            LINKS,
            r#"instance of CIM_Link {
                Left = "root/cimv2:CIM_Element.Id=\"x\"";
                Right = "root/cimv2:CIM_Element.Id=\"y\"";
            };"#
        )),
    )
    .unwrap();
    let link = result.instances_of("cim_link").next().unwrap();
    assert_eq!(link.property("left").unwrap().cim_type, CimType::Reference("CIM_Element".into()));
}

// ──────────────────────────────────────────────
// Directives
// ──────────────────────────────────────────────

#[test]
fn cyclic_include_is_reported_with_its_chain() {
    let repo = InMemoryRepository::new();
    let files = [
        ("/m/x.mof", "#pragma include(\"y.mof\")\nclass X { };"),
        ("/m/y.mof", "#pragma include(\"x.mof\")\nclass Y { };"),
    ];
    let err = file_unit(&repo, &files, "/m/x.mof", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CyclicInclude);
    assert!(
        err.message.contains("/m/x.mof -> /m/y.mof -> /m/x.mof"),
        "{}",
        err
    );
    assert_eq!(err.file, "/m/y.mof");
    assert_eq!(err.line, 1);
}

#[test]
fn namespace_pragma_is_scoped_to_the_file() {
    let repo = InMemoryRepository::new();
    let files = [
        (
            "/s/main.mof",
            "#pragma include(\"sub.mof\")\nclass MainClass { };",
        ),
        (
            "/s/sub.mof",
            "#pragma namespace(\"root/other\")\nclass SubClass { };",
        ),
    ];
    let result = file_unit(&repo, &files, "/s/main.mof", &CompileOptions::default()).unwrap();
    let placed: Vec<(&str, &str)> = result
        .defined_classes
        .iter()
        .map(|c| (c.namespace.as_str(), c.name.as_str()))
        .collect();
    assert_eq!(
        placed,
        vec![("root/other", "SubClass"), ("root/cimv2", "MainClass")]
    );
    assert_eq!(repo.classes("root/other").len(), 1);
}

const REINCLUDE: [(&str, &str); 2] = [
    (
        "/r/main.mof",
        "#pragma include(\"shared.mof\")\n#pragma namespace(\"root/two\")\n#pragma include(\"shared.mof\")\n",
    ),
    (
        "/r/shared.mof",
        "qualifier Description : string = null, Scope(any);\n[Description(\"s\")] class Shared { };\n",
    ),
];

#[test]
fn reincluded_files_are_skipped_by_default() {
    let repo = InMemoryRepository::new();
    let result = file_unit(&repo, &REINCLUDE, "/r/main.mof", &CompileOptions::default()).unwrap();
    assert_eq!(result.defined_classes.len(), 1);
    assert!(repo.classes("root/two").is_empty());
}

#[test]
fn reincluded_files_can_be_recompiled() {
    let repo = InMemoryRepository::new();
    let options = CompileOptions {
        reinclude: ReincludePolicy::Recompile,
        ..CompileOptions::default()
    };
    let result = file_unit(&repo, &REINCLUDE, "/r/main.mof", &options).unwrap();
    assert_eq!(result.defined_classes.len(), 2);
    assert_eq!(repo.classes("root/two").len(), 1);
}

#[test]
fn includes_fall_back_to_the_search_path() {
    let repo = InMemoryRepository::new();
    let files = [
        ("/app/main.mof", "#pragma include(\"qualifiers.mof\")\n[Key] class Bad { };"),
        ("/lib/qualifiers.mof", "qualifier Key : boolean = false, Scope(property);"),
    ];
    let err = file_unit(&repo, &files, "/app/main.mof", &CompileOptions::default()).unwrap_err();
    // The qualifier was found, so the failure is its scope.
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("not allowed"));
}

#[test]
fn missing_include_is_an_io_error_at_the_directive() {
    let repo = InMemoryRepository::new();
    let files = [("/app/main.mof", "class A { };\n#pragma include(\"gone.mof\")\n")];
    let err = file_unit(&repo, &files, "/app/main.mof", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
    assert_eq!(err.file, "/app/main.mof");
    assert_eq!(err.line, 2);
    // Elements before the directive were already defined.
    assert!(repo.lookup_class("root/cimv2", "A").is_ok());
}

#[test]
fn errors_render_with_position_and_kind() {
    let repo = InMemoryRepository::new();
    let err = unit(&repo, buffer("class A {\n  [Nope] string X;\n};")).unwrap_err();
    assert!(err.to_string().starts_with("test.mof:2:3: semantic error:"), "{}", err);
    let json = err.to_json_value();
    assert_eq!(json["kind"], "semantic");
    assert_eq!(json["member"], "X");
}
