#![allow(clippy::result_large_err)]
//! mofc-core: MOF compiler core library.
//!
//! Compiles DMTF MOF source text into validated CIM schema elements and
//! defines them in a [`Repository`](mofc_repository::Repository).
//!
//! # Public API
//!
//! - [`compile()`] / [`compile_with_provider()`] -- compile one unit
//! - [`Compiler`] -- the same, driven step by step
//! - [`CompileOptions`], [`ReincludePolicy`], [`SourceRef`] -- unit inputs
//! - [`CompilationResult`] -- what the unit defined
//! - [`CompileError`], [`ErrorKind`] -- the error type
//! - [`SourceProvider`], [`FileSystemProvider`], [`InMemoryProvider`] --
//!   where source text comes from
//!
//! The tokenizer, parser, symbol table, validator and directive processor
//! are public modules for tooling that needs a single stage.

pub mod ast;
pub mod compile;
pub mod context;
pub mod directive;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod sink;
pub mod source;
pub mod symbols;
pub mod validate;
pub mod value;


// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::Provenance;
pub use compile::{
    compile, compile_with_provider, CompilationResult, CompileOptions, Compiler, Defined,
    ReincludePolicy, SourceRef,
};
pub use context::CompilationContext;
pub use error::{CompileError, ErrorKind};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use symbols::SymbolTable;
