use fibre_component::filter::{by_name, by_pointer, by_type};
use fibre_component::{Container, Definition, Error, Filter, Object, PROTOTYPE, SINGLETON};
use std::sync::Arc;

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

fn new_english_greeter() -> Arc<dyn Greeter> {
  Arc::new(EnglishGreeter)
}

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// --- Basic Tests ---

#[test]
fn test_singleton_returns_the_same_object() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 101 }).named("foo").scoped(SINGLETON))
    .unwrap();

  // Act
  let o1 = container.get_object(&by_name("foo")).unwrap();
  let o2 = container.get_object(&by_name("foo")).unwrap();

  // Assert
  assert_eq!(o1.get::<SimpleService>().unwrap().id, 101);
  assert!(o1.ptr_eq(&o2));
  assert!(container.is_singleton("foo"));
}

#[test]
fn test_prototype_returns_distinct_objects() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 303 }).named("foo").scoped(PROTOTYPE))
    .unwrap();

  // Act
  let o1 = container.get_object(&by_name("foo")).unwrap();
  let o2 = container.get_object(&by_name("foo")).unwrap();

  // Assert
  assert_eq!(o2.get::<SimpleService>().unwrap().id, 303);
  assert!(!o1.ptr_eq(&o2));
  assert!(container.is_prototype("foo"));
  assert!(!container.is_singleton("foo"));
  assert_eq!(container.singletons().count(), 0);
}

#[test]
fn test_default_name_and_typed_resolution() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 7 }))
    .unwrap();

  // Act
  let typed = container.get::<SimpleService>().unwrap();
  let named = container.get_named::<SimpleService>("simpleService").unwrap();

  // Assert
  assert_eq!(*typed, SimpleService { id: 7 });
  assert!(Arc::ptr_eq(&typed, &named));
}

#[test]
fn test_trait_resolution_through_interface_constructor() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::interface(new_english_greeter))
    .unwrap();

  // Act
  let greeter = container.get::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
  assert!(container.contains_object("greeter"));
}

#[test]
fn test_trait_resolution_through_declared_capability() {
  // Arrange
  let container = Container::new();
  container
    .register(
      Definition::of(|| EnglishGreeter)
        .implements::<dyn Greeter>(|it| it as Arc<dyn Greeter>),
    )
    .unwrap();

  // Act
  let greeter = container.get::<dyn Greeter>().unwrap();
  let concrete = container.get::<EnglishGreeter>().unwrap();

  // Assert
  assert_eq!(greeter.greet(), concrete.greet());
}

#[test]
fn test_shared_constructor_satisfies_value_type_lookups() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::shared(|| Arc::new(SimpleService { id: 9 })))
    .unwrap();

  // Act & Assert
  assert_eq!(container.get::<SimpleService>().unwrap().id, 9);
  assert!(container.get_object(&by_pointer::<SimpleService>()).is_ok());
}

#[test]
fn test_registered_singleton_objects() {
  // Arrange
  let container = Container::new();
  container
    .register_singleton("answer", Object::new(42u64))
    .unwrap();

  // Act
  let answer = container.get_named::<u64>("answer").unwrap();
  let duplicate = container.register_singleton("answer", Object::new(43u64));

  // Assert
  assert_eq!(*answer, 42);
  assert!(matches!(duplicate, Err(Error::DuplicateName { .. })));
  assert!(container.is_singleton("answer"));
}

#[test]
fn test_not_found_names_the_request() {
  // Arrange
  let container = Container::new();

  // Act
  let err = container.get_named::<SimpleService>("missing").unwrap_err();

  // Assert
  assert!(err.is_not_found());
  let message = err.to_string();
  assert!(message.contains("name 'missing'"));
  assert!(message.contains("SimpleService"));
}

#[test]
fn test_name_must_match_type_too() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 1 }).named("service"))
    .unwrap();

  // Act & Assert
  assert!(container.get_named::<String>("service").unwrap_err().is_not_found());
  assert!(container.get_object(&by_name("service").and(by_type::<SimpleService>())).is_ok());
}

#[test]
fn test_conflicting_names_match_nothing() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 1 }).named("first"))
    .unwrap();
  container
    .register(Definition::of(|| SimpleService { id: 2 }).named("second"))
    .unwrap();

  // Act
  let result = container.get_object(&by_name("first").and(by_name("second")));

  // Assert
  assert!(result.unwrap_err().is_not_found());
  assert_eq!(container.list_objects(&by_name("first").and(by_name("second"))).unwrap().len(), 0);
}

#[test]
fn test_empty_filter_is_rejected() {
  let container = Container::new();
  assert!(matches!(
    container.get_object(&Filter::default()),
    Err(Error::MissingFilter)
  ));
}

#[test]
fn test_duplicate_definition_names_are_rejected() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|| SimpleService { id: 1 }).named("dup"))
    .unwrap();

  // Act
  let err = container
    .register(Definition::of(|| String::new()).named("dup"))
    .unwrap_err();

  // Assert
  assert!(matches!(err, Error::DuplicateName { ref name } if name == "dup"));
  assert!(err.is_configuration());
}

#[test]
fn test_constructor_returning_nothing_fails() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::shared(|| None::<Arc<SimpleService>>))
    .unwrap();

  // Act
  let err = container.get::<SimpleService>().unwrap_err();

  // Assert
  assert!(matches!(err, Error::ConstructorReturnedNil { .. }));
  assert!(!container.singletons().contains("simpleService"));
}

#[test]
fn test_fallible_constructor_errors_propagate() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::fallible(|| -> Result<SimpleService, std::io::Error> {
      Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
    }))
    .unwrap();

  // Act
  let err = container.get::<SimpleService>().unwrap_err();

  // Assert
  assert!(matches!(err, Error::Construction { ref name, .. } if name == "simpleService"));
  assert!(err.to_string().contains("disk full"));
}
