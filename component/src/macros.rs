//! Public macros for ergonomic object resolution.

/// Resolves an object from a container.
///
/// Expands to a [`Container::get`](crate::Container::get) or
/// [`Container::get_named`](crate::Container::get_named) call and evaluates to
/// `Result<Arc<_>, Error>`.
///
/// # Examples
///
/// ```
/// use fibre_component::{resolve, Container, Definition};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// fn new_greeter() -> Arc<dyn Greeter> {
///   Arc::new(EnglishGreeter)
/// }
///
/// let container = Container::new();
/// container.register(Definition::of(|| String::from("hello"))).unwrap();
/// container.register(Definition::interface(new_greeter).named("english")).unwrap();
///
/// let message = resolve!(container, String).unwrap();
/// assert_eq!(*message, "hello");
///
/// let greeter = resolve!(container, trait Greeter, "english").unwrap();
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // The trait arms come first: `trait X` is not a type and would abort the
  // `ty` matcher.
  ($container:expr, trait $trait_ident:ident) => {
    $container.get::<dyn $trait_ident>()
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $container.get_named::<dyn $trait_ident>($name)
  };

  ($container:expr, $type:ty) => {
    $container.get::<$type>()
  };

  ($container:expr, $type:ty, $name:expr) => {
    $container.get_named::<$type>($name)
  };
}

/// Like [`resolve!`], but evaluates to `Option<Arc<_>>`, discarding the error.
#[macro_export]
macro_rules! maybe_resolve {
  ($container:expr, trait $trait_ident:ident) => {
    $crate::resolve!($container, trait $trait_ident).ok()
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $crate::resolve!($container, trait $trait_ident, $name).ok()
  };

  ($container:expr, $type:ty) => {
    $crate::resolve!($container, $type).ok()
  };

  ($container:expr, $type:ty, $name:expr) => {
    $crate::resolve!($container, $type, $name).ok()
  };
}
