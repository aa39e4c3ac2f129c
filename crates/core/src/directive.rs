//! `#pragma` directives.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{Provenance, RawPragma};
use crate::error::{CompileError, ErrorKind};
use crate::source::SourceProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Include(String),
    Namespace(String),
    Locale(String),
    InstanceLocale(String),
    /// Not a pragma this compiler acts on.
    Unknown(String),
}

impl Directive {
    pub fn from_pragma(pragma: &RawPragma) -> Result<Directive, CompileError> {
        let name = pragma.name.to_ascii_lowercase();
        let build: fn(String) -> Directive = match name.as_str() {
            "include" => Directive::Include,
            "namespace" => Directive::Namespace,
            "locale" => Directive::Locale,
            "instancelocale" => Directive::InstanceLocale,
            _ => return Ok(Directive::Unknown(pragma.name.clone())),
        };
        match pragma.args.as_slice() {
            [arg] => Ok(build(arg.clone())),
            args => Err(CompileError::syntax(
                &pragma.prov,
                format!(
                    "#pragma {} takes one string argument, found {}",
                    pragma.name,
                    args.len()
                ),
            )),
        }
    }
}

/// Locate an included file: first relative to the including file's
/// directory, then under each search path entry in order.
pub fn resolve_include(
    provider: &dyn SourceProvider,
    including_dir: Option<&Path>,
    include: &str,
    search_path: &[PathBuf],
    prov: &Provenance,
) -> Result<PathBuf, CompileError> {
    let candidates = including_dir.into_iter().chain(search_path.iter().map(PathBuf::as_path));
    for dir in candidates {
        let candidate = provider.resolve_include(dir, include);
        if provider.exists(&candidate) {
            debug!(include, resolved = %candidate.display(), "resolved include");
            return Ok(candidate);
        }
    }
    // A buffer has no directory of its own; fall back to the path as given.
    let direct = Path::new(include);
    if including_dir.is_none() && provider.exists(direct) {
        return Ok(direct.to_path_buf());
    }
    Err(CompileError::new(
        ErrorKind::Io,
        prov,
        format!("cannot find included file '{}'", include),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;
    use std::collections::HashMap;

    fn pragma(name: &str, args: &[&str]) -> RawPragma {
        RawPragma {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            prov: Provenance::new("a.mof", 1, 1),
        }
    }

    #[test]
    fn pragma_names_ignore_case() {
        assert_eq!(
            Directive::from_pragma(&pragma("NameSpace", &["root/x"])).unwrap(),
            Directive::Namespace("root/x".into())
        );
        assert_eq!(
            Directive::from_pragma(&pragma("instancelocale", &["en_US"])).unwrap(),
            Directive::InstanceLocale("en_US".into())
        );
        assert_eq!(
            Directive::from_pragma(&pragma("comment", &["a", "b"])).unwrap(),
            Directive::Unknown("comment".into())
        );
    }

    #[test]
    fn known_pragmas_take_one_argument() {
        let err = Directive::from_pragma(&pragma("include", &[])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn includes_search_the_including_directory_first() {
        let files: HashMap<PathBuf, String> = [
            ("/src/common.mof", ""),
            ("/lib/common.mof", ""),
            ("/lib/only.mof", ""),
        ]
        .into_iter()
        .map(|(p, s)| (PathBuf::from(p), s.to_string()))
        .collect();
        let provider = InMemoryProvider::new(files);
        let search = vec![PathBuf::from("/lib")];
        let prov = Provenance::new("/src/main.mof", 1, 1);

        let found =
            resolve_include(&provider, Some(Path::new("/src")), "common.mof", &search, &prov)
                .unwrap();
        assert_eq!(found, PathBuf::from("/src/common.mof"));
        let found =
            resolve_include(&provider, Some(Path::new("/src")), "only.mof", &search, &prov)
                .unwrap();
        assert_eq!(found, PathBuf::from("/lib/only.mof"));

        let err = resolve_include(&provider, Some(Path::new("/src")), "nope.mof", &search, &prov)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.file, "/src/main.mof");
    }
}
