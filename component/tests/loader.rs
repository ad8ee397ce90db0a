use fibre_component::condition::{OnMissingObject, OnMissingType, OnObject, OnProfile, OnProperty, OnType};
use fibre_component::{
  Components, ConditionContext, ConditionalLoader, Container, Context, Definition, Error, Object,
  StandardEnvironment, ACTIVE_PROFILES_PROPERTY,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

trait Store: Send + Sync {
  fn kind(&self) -> &'static str;
}

struct MemoryStore;
impl Store for MemoryStore {
  fn kind(&self) -> &'static str {
    "memory"
  }
}

struct RedisStore;
impl Store for RedisStore {
  fn kind(&self) -> &'static str {
    "redis"
  }
}

fn new_memory_store() -> Arc<dyn Store> {
  Arc::new(MemoryStore)
}

fn new_redis_store() -> Arc<dyn Store> {
  Arc::new(RedisStore)
}

struct Audit;
struct Mailer;

fn load(container: &Container, env: &StandardEnvironment, components: Components) -> fibre_component::LoadReport {
  ConditionalLoader::new(container, env)
    .load(&Context::background(), components)
    .unwrap()
}

// --- Fixed Point Tests ---

#[test]
fn test_dependent_component_declared_first_is_admitted() {
  // Arrange: A requires B, declared before B.
  let container = Container::new();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(OnObject::new("mailer")))
    .unwrap();
  components.register(Definition::of(|| Mailer)).unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert
  assert_eq!(report.admitted, vec!["mailer", "audit"]);
  assert!(report.skipped.is_empty());
  assert!(report.passes <= 2);
  assert!(container.definitions().contains("audit"));
}

#[test]
fn test_admission_is_independent_of_declaration_order() {
  let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

  for order in orders {
    // Arrange: audit needs mailer, mailer needs a store, the store is unconditional.
    let container = Container::new();
    let env = StandardEnvironment::new();
    let mut components = Components::new();
    for index in order {
      match index {
        0 => components
          .register(Definition::of(|| Audit).conditional_on(OnObject::new("mailer")))
          .unwrap(),
        1 => components
          .register(Definition::of(|| Mailer).conditional_on(OnType::new::<dyn Store>()))
          .unwrap(),
        _ => components.register(Definition::interface(new_memory_store)).unwrap(),
      }
    }

    // Act
    let report = load(&container, &env, components);

    // Assert
    assert_eq!(report.admitted.len(), 3, "order {:?}", order);
    assert!(report.passes <= 3, "order {:?}", order);
  }
}

#[test]
fn test_unsatisfiable_component_is_left_out_silently() {
  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(OnObject::new("neverRegistered")))
    .unwrap();
  components.register(Definition::of(|| Mailer)).unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert
  assert_eq!(report.admitted, vec!["mailer"]);
  assert_eq!(report.skipped, vec!["audit"]);
  assert_eq!(report.passes, 2);
  assert!(!container.contains_object("audit"));
}

fn store_components() -> Components {
  let mut components = Components::new();
  components
    .register(
      Definition::interface(new_redis_store)
        .named("redisStore")
        .conditional_on(OnProperty::new("store.redis.enabled")),
    )
    .unwrap();
  components
    .register(
      Definition::interface(new_memory_store)
        .named("memoryStore")
        .conditional_on(OnMissingType::new::<dyn Store>())
        .conditional_on(OnMissingObject::new("redisStore")),
    )
    .unwrap();
  components
}

#[test]
fn test_on_missing_type_provides_a_fallback() {
  // Arrange
  let with_redis = Container::new();
  let without_redis = Container::new();
  let redis_env = StandardEnvironment::new().with_property("store.redis.enabled", "true");
  let plain_env = StandardEnvironment::new();

  // Act
  let with_redis_report = load(&with_redis, &redis_env, store_components());
  let without_redis_report = load(&without_redis, &plain_env, store_components());

  // Assert
  assert_eq!(with_redis_report.admitted, vec!["redisStore"]);
  assert_eq!(with_redis_report.skipped, vec!["memoryStore"]);
  assert_eq!(with_redis.get::<dyn Store>().unwrap().kind(), "redis");

  assert_eq!(without_redis_report.admitted, vec!["memoryStore"]);
  assert_eq!(without_redis_report.skipped, vec!["redisStore"]);
  assert_eq!(without_redis.get::<dyn Store>().unwrap().kind(), "memory");
}

#[test]
fn test_conditions_see_registered_singletons() {
  // Arrange
  let container = Container::new();
  container
    .register_singleton("mailer", Object::new(Mailer))
    .unwrap();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(OnObject::new("mailer")))
    .unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert
  assert_eq!(report.admitted, vec!["audit"]);
  assert_eq!(report.passes, 1);
}

#[test]
fn test_duplicate_name_aborts_loading() {
  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components.register(Definition::of(|| Mailer).named("x")).unwrap();
  components.register(Definition::of(|| Audit).named("x")).unwrap();

  // Act
  let result = ConditionalLoader::new(&container, &env).load(&Context::background(), components);

  // Assert
  assert!(matches!(result, Err(Error::DuplicateName { ref name }) if name == "x"));
}

#[test]
fn test_done_context_admits_only_unconditional_components() {
  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(|_: &ConditionContext<'_>| true))
    .unwrap();
  components.register(Definition::of(|| Mailer)).unwrap();
  let ctx = Context::background();
  ctx.cancel();

  // Act
  let report = ConditionalLoader::new(&container, &env).load(&ctx, components).unwrap();

  // Assert
  assert_eq!(report.admitted, vec!["mailer"]);
  assert_eq!(report.skipped, vec!["audit"]);
}

#[test]
fn test_conditions_are_evaluated_once_per_pass() {
  static EVALUATIONS: AtomicUsize = AtomicUsize::new(0);

  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new();
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(|_: &ConditionContext<'_>| {
      EVALUATIONS.fetch_add(1, Ordering::SeqCst);
      false
    }))
    .unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert: the first pass admits nothing, which is the fixed point.
  assert_eq!(report.passes, 1);
  assert_eq!(EVALUATIONS.load(Ordering::SeqCst), 1);
}

// --- Environment Conditions ---

#[test]
fn test_profile_condition() {
  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new().with_property(ACTIVE_PROFILES_PROPERTY, "dev,eu");
  let mut components = Components::new();
  components
    .register(Definition::of(|| Audit).conditional_on(OnProfile::new(["dev", "eu"])))
    .unwrap();
  components
    .register(Definition::of(|| Mailer).conditional_on(OnProfile::new(["dev", "prod"])))
    .unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert
  assert_eq!(report.admitted, vec!["audit"]);
  assert_eq!(report.skipped, vec!["mailer"]);
}

#[test]
fn test_property_condition() {
  // Arrange
  let container = Container::new();
  let env = StandardEnvironment::new()
    .with_property("store.kind", "redis")
    .with_property("audit.enabled", "false");
  let mut components = Components::new();
  components
    .register(
      Definition::interface(new_redis_store)
        .conditional_on(OnProperty::new("kind").prefix("store").having_value("redis")),
    )
    .unwrap();
  components
    .register(Definition::of(|| Audit).conditional_on(OnProperty::new("audit.enabled")))
    .unwrap();
  components
    .register(
      Definition::of(|| Mailer).conditional_on(OnProperty::new("mailer.enabled").match_if_missing(true)),
    )
    .unwrap();

  // Act
  let report = load(&container, &env, components);

  // Assert
  assert_eq!(report.admitted, vec!["store", "mailer"]);
  assert_eq!(report.skipped, vec!["audit"]);
}
