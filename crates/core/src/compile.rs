//! Compiler entry contract.
//!
//! A [`Compiler`] runs one compilation unit: the top-level source and every
//! file it includes. Top-level productions are acted on as soon as they are
//! parsed. Qualifier declarations and classes are validated and defined,
//! instances are defined or queued until their alias references resolve,
//! pragmas are executed. [`Compiler::finish`] runs phase two and reports
//! every forward reference still open.

use std::collections::HashSet;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use mofc_repository::Repository;
use mofc_schema::{ClassDefinition, InstanceDefinition, InstancePath, QualifierDeclaration};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ast::{Production, Provenance, RawClass, RawInstance, RawPragma, RawQualifierDecl};
use crate::context::CompilationContext;
use crate::directive::{self, Directive};
use crate::error::{CompileError, ErrorKind};
use crate::parser::Parser;
use crate::resolve;
use crate::sink::{self, RepositorySink};
use crate::source::{FileSystemProvider, SourceProvider};
use crate::symbols::{namespace_key, Declared, SymbolTable, Waiting};
use crate::validate::{CheckedInstance, Checker};

/// What to do when a file already compiled in this unit is included again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReincludePolicy {
    /// Ignore the include.
    #[default]
    Skip,
    /// Compile the file again; identical redeclarations are no-ops.
    Recompile,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Accumulate semantic errors instead of stopping at the first one.
    pub best_effort: bool,
    pub reinclude: ReincludePolicy,
    /// Qualifier scopes are matched against the element's own kind only.
    pub strict_scope: bool,
    /// Abort once this many semantic errors have been seen.
    pub max_errors: Option<usize>,
}

/// The top-level input of a compilation unit.
#[derive(Debug, Clone)]
pub enum SourceRef {
    File(PathBuf),
    Buffer { name: String, text: String },
}

/// An element together with the namespace it was defined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defined<T> {
    pub namespace: String,
    #[serde(flatten)]
    pub element: T,
}

impl<T> Deref for Defined<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.element
    }
}

/// Everything a unit defined, in definition order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationResult {
    pub defined_qualifiers: Vec<Defined<QualifierDeclaration>>,
    pub defined_classes: Vec<Defined<ClassDefinition>>,
    pub defined_instances: Vec<Defined<InstanceDefinition>>,
    /// Semantic errors recorded in best-effort mode.
    pub errors: Vec<CompileError>,
}

impl CompilationResult {
    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.defined_classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(Deref::deref)
    }

    pub fn qualifier(&self, name: &str) -> Option<&QualifierDeclaration> {
        self.defined_qualifiers
            .iter()
            .find(|q| q.name.eq_ignore_ascii_case(name))
            .map(Deref::deref)
    }

    pub fn instances_of<'s>(&'s self, class: &'s str) -> impl Iterator<Item = &'s InstanceDefinition> {
        self.defined_instances
            .iter()
            .filter(move |i| i.class_name.eq_ignore_ascii_case(class))
            .map(Deref::deref)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compile one unit from the filesystem into `repository`.
pub fn compile(
    source: SourceRef,
    initial_namespace: &str,
    search_path: &[PathBuf],
    options: &CompileOptions,
    repository: &dyn Repository,
) -> Result<CompilationResult, CompileError> {
    compile_with_provider(
        source,
        initial_namespace,
        search_path,
        options,
        repository,
        &FileSystemProvider,
    )
}

/// Compile one unit reading files through `provider`.
pub fn compile_with_provider(
    source: SourceRef,
    initial_namespace: &str,
    search_path: &[PathBuf],
    options: &CompileOptions,
    repository: &dyn Repository,
    provider: &dyn SourceProvider,
) -> Result<CompilationResult, CompileError> {
    let mut compiler = Compiler::new(
        repository,
        provider,
        initial_namespace,
        search_path.to_vec(),
        options.clone(),
    );
    compiler.compile_source(source)?;
    compiler.finish()
}

pub struct Compiler<'a> {
    repository: &'a dyn Repository,
    provider: &'a dyn SourceProvider,
    search_path: Vec<PathBuf>,
    options: CompileOptions,
    symbols: SymbolTable,
    context: CompilationContext,
    queued: Vec<CheckedInstance>,
    /// Classes that failed validation, by (namespace key, lowercase name).
    rejected: HashSet<(String, String)>,
    result: CompilationResult,
}

impl<'a> Compiler<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        provider: &'a dyn SourceProvider,
        initial_namespace: &str,
        search_path: Vec<PathBuf>,
        options: CompileOptions,
    ) -> Self {
        Compiler {
            repository,
            provider,
            search_path,
            options,
            symbols: SymbolTable::new(),
            context: CompilationContext::new(initial_namespace),
            queued: Vec::new(),
            rejected: HashSet::new(),
            result: CompilationResult::default(),
        }
    }

    pub fn context(&self) -> &CompilationContext {
        &self.context
    }

    pub fn compile_source(&mut self, source: SourceRef) -> Result<(), CompileError> {
        match source {
            SourceRef::File(path) => {
                let prov = Provenance::new(&path.display().to_string(), 0, 0);
                self.compile_file(&path, &prov)
            }
            SourceRef::Buffer { name, text } => self.compile_text(&text, &name),
        }
    }

    /// Phase two: resolve deferred aliases, define the queued instances and
    /// fail on anything still unresolved.
    pub fn finish(mut self) -> Result<CompilationResult, CompileError> {
        if let Some(parked) = self.symbols.take_parked().first() {
            return Err(resolve::unresolved_class(parked));
        }
        let queued = std::mem::take(&mut self.queued);
        if !queued.is_empty() {
            debug!(count = queued.len(), "resolving deferred alias references");
        }
        for checked in resolve::resolve_aliases(&mut self.symbols, queued)? {
            self.define_instance(checked)?;
        }
        Ok(self.result)
    }

    // ── Sources ─────────────────────────────────

    /// `prov` is where the file was asked for: the include directive, or a
    /// position-less marker for the top-level file.
    fn compile_file(&mut self, path: &Path, prov: &Provenance) -> Result<(), CompileError> {
        let canonical = self
            .provider
            .canonicalize(path)
            .map_err(|e| io_error(prov, path, e))?;
        if self.context.is_active(&canonical) {
            return Err(CompileError::new(
                ErrorKind::CyclicInclude,
                prov,
                format!("include cycle: {}", self.context.cycle_chain(&canonical)),
            ));
        }
        if self.context.is_completed(&canonical) && self.options.reinclude == ReincludePolicy::Skip
        {
            warn!(file = %canonical.display(), "file already compiled in this unit; skipping");
            return Ok(());
        }
        let text = self
            .provider
            .read_source(&canonical)
            .map_err(|e| io_error(prov, &canonical, e))?;

        let scope = self.context.enter_file(canonical.clone());
        let outcome = self.compile_text(&text, &canonical.display().to_string());
        self.context.leave_file(scope, outcome.is_ok());
        outcome
    }

    fn compile_text(&mut self, text: &str, file: &str) -> Result<(), CompileError> {
        let mut parser = Parser::new(text, file);
        while let Some(production) = parser.next_production()? {
            match production {
                // Includes carry the terminal error of the included file.
                Production::Pragma(pragma) => self.pragma(pragma)?,
                other => {
                    if let Err(e) = self.production(other) {
                        self.recover(e)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Record a recoverable error, or hand back the one that ends the unit.
    fn recover(&mut self, err: CompileError) -> Result<(), CompileError> {
        if err.is_fatal() || !self.options.best_effort {
            return Err(err);
        }
        if self
            .options
            .max_errors
            .is_some_and(|max| self.result.errors.len() + 1 >= max)
        {
            return Err(err);
        }
        debug!(error = %err, "recorded semantic error; continuing");
        self.result.errors.push(err);
        Ok(())
    }

    fn pragma(&mut self, pragma: RawPragma) -> Result<(), CompileError> {
        match Directive::from_pragma(&pragma)? {
            Directive::Include(include) => {
                let path = directive::resolve_include(
                    self.provider,
                    self.context.current_dir(),
                    &include,
                    &self.search_path,
                    &pragma.prov,
                )?;
                self.compile_file(&path, &pragma.prov)
            }
            Directive::Namespace(namespace) => {
                debug!(namespace = %namespace, "switching namespace");
                self.context.namespace = namespace;
                Ok(())
            }
            Directive::Locale(locale) => {
                debug!(locale = %locale, "setting locale");
                self.context.locale = Some(locale);
                Ok(())
            }
            Directive::InstanceLocale(locale) => {
                debug!(locale = %locale, "setting instance locale");
                self.context.instance_locale = Some(locale);
                Ok(())
            }
            Directive::Unknown(name) => {
                warn!(pragma = %name, at = %pragma.prov, "ignoring unknown pragma");
                Ok(())
            }
        }
    }

    // ── Elements ────────────────────────────────

    fn checker<'s>(&'s self, namespace: &'s str) -> Checker<'s> {
        Checker {
            symbols: &self.symbols,
            repository: self.repository,
            namespace,
            strict_scope: self.options.strict_scope,
        }
    }

    fn sink(&self) -> RepositorySink<'a> {
        RepositorySink::new(self.repository)
    }

    fn production(&mut self, production: Production) -> Result<(), CompileError> {
        let namespace = self.context.namespace.clone();
        match production {
            Production::Pragma(pragma) => self.pragma(pragma),
            Production::QualifierDecl(raw) => self.qualifier_decl(&namespace, raw),
            Production::Class(raw) => self.class(&namespace, raw),
            Production::Instance(raw) => self.instance(&namespace, raw),
        }
    }

    fn qualifier_decl(&mut self, namespace: &str, raw: RawQualifierDecl) -> Result<(), CompileError> {
        let decl = self.checker(namespace).qualifier_declaration(&raw)?;
        let declared = self
            .symbols
            .declare_qualifier(namespace, &decl)
            .map_err(|m| CompileError::semantic(&raw.prov, &raw.name, None, m))?;
        if declared == Declared::Unchanged {
            return Ok(());
        }
        self.sink().qualifier(namespace, &decl, &raw.prov)?;
        self.result.defined_qualifiers.push(Defined {
            namespace: namespace.to_owned(),
            element: decl,
        });
        Ok(())
    }

    /// A class that fails is recorded as rejected, and everything waiting
    /// for it fails in turn.
    fn class(&mut self, namespace: &str, raw: RawClass) -> Result<(), CompileError> {
        let name = raw.name.clone();
        if let Err(e) = self.define_class(namespace, raw) {
            self.recover(e)?;
            self.reject(namespace, &name)?;
        }
        Ok(())
    }

    fn reject(&mut self, namespace: &str, class: &str) -> Result<(), CompileError> {
        self.rejected
            .insert((namespace_key(namespace), class.to_ascii_lowercase()));
        self.release(namespace, class)
    }

    fn is_rejected(&self, namespace: &str, class: &str) -> bool {
        self.rejected
            .contains(&(namespace_key(namespace), class.to_ascii_lowercase()))
    }

    fn define_class(&mut self, namespace: &str, raw: RawClass) -> Result<(), CompileError> {
        let superclass = match &raw.superclass {
            None => None,
            Some(name) => match self
                .symbols
                .lookup_class(self.repository, namespace, name)
                .map_err(|e| sink::lookup_error(e, &raw.prov))?
            {
                Some(class) => Some(class),
                None if self.is_rejected(namespace, name) => {
                    return Err(CompileError::semantic(
                        &raw.prov,
                        &raw.name,
                        None,
                        format!("superclass '{}' of class '{}' was rejected", name, raw.name),
                    ));
                }
                None => {
                    debug!(class = %raw.name, superclass = %name, "superclass not defined yet; deferring");
                    let missing = name.clone();
                    self.symbols.park(namespace, &missing, Waiting::Class(raw));
                    return Ok(());
                }
            },
        };

        let class = self.checker(namespace).class(&raw, superclass.as_ref())?;
        let declared = self
            .symbols
            .declare_class(namespace, &class)
            .map_err(|m| CompileError::semantic(&raw.prov, &raw.name, None, m))?;
        if let Some(alias) = &raw.alias {
            let path = InstancePath {
                namespace: namespace.to_owned(),
                class_name: class.name.clone(),
                keybindings: Vec::new(),
            };
            self.symbols
                .define_alias(alias, Some(path), &raw.prov)
                .map_err(|m| CompileError::semantic(&raw.prov, &raw.name, None, m))?;
        }
        if declared == Declared::Unchanged {
            return Ok(());
        }

        self.sink().class(namespace, &class, &raw.prov)?;
        let name = class.name.clone();
        self.result.defined_classes.push(Defined {
            namespace: namespace.to_owned(),
            element: class,
        });
        self.release(namespace, &name)
    }

    /// Process everything that was waiting for `class`.
    fn release(&mut self, namespace: &str, class: &str) -> Result<(), CompileError> {
        for parked in self.symbols.release(namespace, class) {
            debug!(class, namespace = %parked.namespace, "releasing deferred element");
            let outcome = match parked.item {
                Waiting::Class(raw) => self.class(&parked.namespace, raw),
                Waiting::Instance(raw) => self.instance(&parked.namespace, raw),
            };
            if let Err(e) = outcome {
                self.recover(e)?;
            }
        }
        Ok(())
    }

    fn instance(&mut self, namespace: &str, raw: RawInstance) -> Result<(), CompileError> {
        let class = match self
            .symbols
            .lookup_class(self.repository, namespace, &raw.class_name)
            .map_err(|e| sink::lookup_error(e, &raw.prov))?
        {
            Some(class) => class,
            None if self.is_rejected(namespace, &raw.class_name) => {
                return Err(CompileError::semantic(
                    &raw.prov,
                    &raw.class_name,
                    None,
                    format!("class '{}' of instance was rejected", raw.class_name),
                ));
            }
            None => {
                debug!(class = %raw.class_name, "class not defined yet; deferring instance");
                let missing = raw.class_name.clone();
                self.symbols.park(namespace, &missing, Waiting::Instance(raw));
                return Ok(());
            }
        };

        let mut checked = self.checker(namespace).instance(&raw, &class)?;
        checked.fill(&self.symbols);
        if let Some(alias) = &raw.alias {
            self.symbols
                .define_alias(alias, checked.path(), &raw.prov)
                .map_err(|m| CompileError::semantic(&raw.prov, &class.name, None, m))?;
        }
        if checked.is_complete() {
            self.define_instance(checked)
        } else {
            debug!(class = %class.name, "instance waits on aliases; queued");
            self.queued.push(checked);
            Ok(())
        }
    }

    fn define_instance(&mut self, checked: CheckedInstance) -> Result<(), CompileError> {
        let namespace = checked.namespace.clone();
        let prov = checked.prov.clone();
        let class = checked.instance.class_name.clone();
        let Some(instance) = checked.into_definition() else {
            return Err(CompileError::incomplete(
                &prov,
                &class,
                "instance has unresolved references",
            ));
        };
        let ns = namespace_key(&namespace);
        let already = self
            .result
            .defined_instances
            .iter()
            .any(|d| namespace_key(&d.namespace) == ns && d.element == instance);
        if already {
            return Ok(());
        }
        self.sink().instance(&namespace, &instance, &prov)?;
        self.result.defined_instances.push(Defined {
            namespace,
            element: instance,
        });
        Ok(())
    }
}

fn io_error(prov: &Provenance, path: &Path, err: std::io::Error) -> CompileError {
    CompileError::new(
        ErrorKind::Io,
        prov,
        format!("cannot read {}: {}", path.display(), err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mofc_repository::InMemoryRepository;

    fn buffer(text: &str) -> SourceRef {
        SourceRef::Buffer {
            name: "unit.mof".into(),
            text: text.into(),
        }
    }

    const PRELUDE: &str = r#"
        qualifier Key : boolean = false, Scope(property, reference), Flavor(DisableOverride);
        qualifier Description : string = null, Scope(any);
    "#;

    #[test]
    fn definitions_reach_the_repository_in_order() {
        let repo = InMemoryRepository::new();
        let src = format!(
            "{}{}",
            PRELUDE,
            "class A { [Key] string Id; }; instance of A { Id = \"1\"; };"
        );
        let result = compile(buffer(&src), "root/x", &[], &CompileOptions::default(), &repo)
            .unwrap();
        assert_eq!(result.defined_qualifiers.len(), 2);
        assert_eq!(result.defined_classes[0].namespace, "root/x");
        assert_eq!(result.instances_of("a").count(), 1);
        assert_eq!(repo.classes("root/x").len(), 1);
        assert_eq!(repo.instances("root/x").len(), 1);
        assert!(result.is_clean());
    }

    #[test]
    fn subclass_before_superclass_is_deferred() {
        let repo = InMemoryRepository::new();
        let src = "class Sub : Base { string B; }; class Base { string A; };";
        let result = compile(buffer(src), "root", &[], &CompileOptions::default(), &repo).unwrap();
        let names: Vec<&str> = result.defined_classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Sub"]);
        assert_eq!(result.class("sub").unwrap().properties.len(), 2);
    }

    #[test]
    fn instance_before_its_class_is_deferred() {
        let repo = InMemoryRepository::new();
        let src = format!(
            "{}{}",
            PRELUDE,
            "instance of A { Id = \"1\"; }; class A { [Key] string Id; };"
        );
        let result =
            compile(buffer(&src), "root", &[], &CompileOptions::default(), &repo).unwrap();
        assert_eq!(result.defined_instances.len(), 1);
    }

    #[test]
    fn missing_superclass_is_an_incomplete_schema() {
        let repo = InMemoryRepository::new();
        let err = compile(
            buffer("class Sub : Nowhere { };"),
            "root",
            &[],
            &CompileOptions::default(),
            &repo,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteSchema);
        assert!(err.message.contains("Nowhere"));
        assert!(repo.classes("root").is_empty());
    }

    #[test]
    fn max_errors_stops_a_best_effort_unit() {
        let repo = InMemoryRepository::new();
        let options = CompileOptions {
            best_effort: true,
            max_errors: Some(2),
            ..CompileOptions::default()
        };
        let src = "[A] class X { }; [B] class Y { }; [C] class Z { };";
        let err = compile(buffer(src), "root", &[], &options, &repo).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.element.as_deref(), Some("Y"));
    }

    #[test]
    fn unknown_pragmas_are_ignored() {
        let repo = InMemoryRepository::new();
        let src = "#pragma comment(\"hello\")\n#pragma locale(\"en_US\")\nclass A { };";
        let result = compile(buffer(src), "root", &[], &CompileOptions::default(), &repo).unwrap();
        assert_eq!(result.defined_classes.len(), 1);
    }

    #[test]
    fn buffer_pragmas_update_the_context() {
        let repo = InMemoryRepository::new();
        let provider = crate::source::InMemoryProvider::new(std::collections::HashMap::new());
        let mut compiler =
            Compiler::new(&repo, &provider, "root", Vec::new(), CompileOptions::default());
        let src = "#pragma namespace(\"root/other\")\n#pragma locale(\"en_US\")\nclass A { };";
        compiler.compile_source(buffer(src)).unwrap();
        assert_eq!(compiler.context().namespace, "root/other");
        assert_eq!(compiler.context().locale.as_deref(), Some("en_US"));
        let result = compiler.finish().unwrap();
        assert_eq!(result.defined_classes[0].namespace, "root/other");
    }

    #[test]
    fn defined_serializes_flat() {
        let d = Defined {
            namespace: "root".to_string(),
            element: mofc_schema::ClassDefinition {
                name: "A".into(),
                superclass: None,
                alias: None,
                qualifiers: vec![],
                properties: vec![],
                methods: vec![],
            },
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["namespace"], "root");
        assert_eq!(json["name"], "A");
    }
}
