use fibre_component::condition::{OnMissingType, OnProfile, OnProperty};
use fibre_component::{
  resolve, Components, ConditionalLoader, Container, Context, Definition, StandardEnvironment,
  ACTIVE_PROFILES_PROPERTY,
};
use std::sync::Arc;
use std::time::Duration;

trait Store: Send + Sync {
  fn describe(&self) -> String;
}

struct RedisStore;
impl Store for RedisStore {
  fn describe(&self) -> String {
    "redis store".to_string()
  }
}

struct MemoryStore;
impl Store for MemoryStore {
  fn describe(&self) -> String {
    "in-memory store".to_string()
  }
}

struct DebugEndpoint;

fn new_redis_store() -> Arc<dyn Store> {
  Arc::new(RedisStore)
}

fn new_memory_store() -> Arc<dyn Store> {
  Arc::new(MemoryStore)
}

fn main() -> fibre_component::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new("fibre_component=debug"))
    .init();

  let environment = StandardEnvironment::new()
    .with_property(ACTIVE_PROFILES_PROPERTY, "dev")
    .with_property("store.redis.enabled", "false");

  // Redis is switched off, so the in-memory fallback is the only store admitted.
  let mut components = Components::new();
  components.register(
    Definition::interface(new_memory_store)
      .named("memoryStore")
      .conditional_on(OnMissingType::new::<dyn Store>()),
  )?;
  components.register(
    Definition::interface(new_redis_store)
      .named("redisStore")
      .conditional_on(OnProperty::new("enabled").prefix("store.redis")),
  )?;
  components.register(Definition::of(|| DebugEndpoint).conditional_on(OnProfile::new(["dev"])))?;

  let container = Container::new();
  let ctx = Context::background().with_timeout(Duration::from_secs(5));
  let report = ConditionalLoader::new(&container, &environment).load(&ctx, components)?;
  println!(
    "admitted {:?}, skipped {:?} after {} passes",
    report.admitted, report.skipped, report.passes
  );

  let store = resolve!(container, trait Store)?;
  println!("Using the {}", store.describe());
  assert!(resolve!(container, DebugEndpoint).is_ok());

  Ok(())
}
