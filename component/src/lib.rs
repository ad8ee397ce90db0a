//! # Fibre Component
//!
//! A conditional, thread-safe Inversion of Control (IoC) container for Rust.
//!
//! Components are declared as [`Definition`]s: a constructor function plus a
//! name, a scope and wiring options. The container resolves constructor
//! arguments from the parameter types, constructs objects on demand, caches
//! them according to their scope and runs every object through the
//! [`ObjectProcessor`] pipeline.
//!
//! ## Core Concepts
//!
//! - **Definition**: how to build one named component. Built with
//!   [`Definition::of`], [`Definition::fallible`], [`Definition::shared`] or
//!   [`Definition::interface`].
//! - **Container**: resolves objects by name and/or type through
//!   [`Container::get_object`] and the typed helpers [`Container::get`],
//!   [`Container::get_named`] and [`Container::list`].
//! - **Scopes**: `singleton` (the default) caches one object per name,
//!   `prototype` builds a new one per request, and custom [`Scope`]s can be
//!   registered by name.
//! - **Conditions**: [`ConditionalLoader`] admits [`Components`] only when
//!   their [`Condition`]s hold, repeating until nothing more can be admitted.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_component::{resolve, Container, Definition};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     (*self.message).clone()
//!   }
//! }
//!
//! fn new_greeter(message: Arc<String>) -> Arc<dyn Greeter> {
//!   Arc::new(EnglishGreeter { message })
//! }
//!
//! fn main() {
//!   let container = Container::new();
//!   container
//!     .register(Definition::of(|| String::from("Hello, World!")).named("greetingMessage"))
//!     .unwrap();
//!   container.register(Definition::interface(new_greeter)).unwrap();
//!
//!   let greeter = resolve!(container, trait Greeter).unwrap();
//!   assert_eq!(greeter.greet(), "Hello, World!");
//! }
//! ```

pub mod condition;
mod config;
mod container;
mod context;
mod core;
mod definition;
mod environment;
mod error;
pub mod filter;
mod inject;
mod loader;
mod macros;
mod processor;
mod registry;
mod scope;
mod singleton;
mod types;

pub use condition::{Condition, ConditionContext, ConditionEvaluator};
pub use config::{ArgumentFallback, ContainerConfig, ListPolicy};
pub use container::Container;
pub use context::Context;
pub use definition::{Argument, Definition, DefinitionBuilder, IntoShared};
pub use environment::{
  Environment, StandardEnvironment, ACTIVE_PROFILES_PROPERTY, DEFAULT_PROFILES_PROPERTY, DEFAULT_PROFILE,
};
pub use error::{BoxError, Error, Result};
pub use filter::Filter;
pub use inject::{ArgumentKind, ArgumentMismatch, Constructor, Inject, Parameter, Resolved, Value};
pub use loader::{Component, Components, ConditionalLoader, LoadReport};
pub use processor::{Initialize, ObjectProcessor};
pub use registry::DefinitionRegistry;
pub use scope::{ObjectProvider, PrototypeScope, Scope, SingletonScope, ThreadScope, PROTOTYPE, SINGLETON};
pub use singleton::SingletonRegistry;
pub use types::{Capability, Object, TypeInfo, TypeKey, TypeKind};
