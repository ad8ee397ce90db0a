use fibre_component::{ArgumentFallback, Container, ContainerConfig, Definition, Error, Object, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

trait Plugin: std::fmt::Debug + Send + Sync {
  fn id(&self) -> &'static str;
}

#[derive(Debug)]
struct AuditPlugin;
impl Plugin for AuditPlugin {
  fn id(&self) -> &'static str {
    "audit"
  }
}

#[derive(Debug)]
struct MetricsPlugin;
impl Plugin for MetricsPlugin {
  fn id(&self) -> &'static str {
    "metrics"
  }
}

fn new_audit_plugin() -> Arc<dyn Plugin> {
  Arc::new(AuditPlugin)
}

fn new_metrics_plugin() -> Arc<dyn Plugin> {
  Arc::new(MetricsPlugin)
}

struct PluginHost {
  plugins: Vec<Arc<dyn Plugin>>,
}

fn new_plugin_host(plugins: Vec<Arc<dyn Plugin>>) -> PluginHost {
  PluginHost { plugins }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Settings {
  retries: u32,
}

struct Client {
  settings: Settings,
  tracer: Option<Arc<String>>,
}

fn new_client(settings: Value<Settings>, tracer: Option<Arc<String>>) -> Client {
  Client {
    settings: settings.into_inner(),
    tracer,
  }
}

// --- Argument Resolution Tests ---

#[test]
fn test_collection_argument_is_empty_without_candidates() {
  // Arrange
  let container = Container::new();
  container.register(Definition::of(new_plugin_host)).unwrap();

  // Act
  let host = container.get::<PluginHost>().unwrap();

  // Assert
  assert!(host.plugins.is_empty());
}

#[test]
fn test_collection_argument_collects_every_candidate_in_order() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::interface(new_metrics_plugin).named("metrics").priority(2))
    .unwrap();
  container
    .register(Definition::interface(new_audit_plugin).named("audit").priority(1))
    .unwrap();
  container.register(Definition::of(new_plugin_host)).unwrap();

  // Act
  let host = container.get::<PluginHost>().unwrap();
  let ids: Vec<&str> = host.plugins.iter().map(|plugin| plugin.id()).collect();

  // Assert
  assert_eq!(ids, vec!["audit", "metrics"]);
}

#[test]
fn test_missing_value_and_optional_arguments_are_substituted() {
  // Arrange
  let container = Container::new();
  container.register(Definition::of(new_client)).unwrap();

  // Act
  let client = container.get::<Client>().unwrap();

  // Assert
  assert_eq!(client.settings, Settings::default());
  assert!(client.tracer.is_none());
}

#[test]
fn test_present_value_and_optional_arguments_are_injected() {
  // Arrange
  let container = Container::new();
  container
    .register_singleton("settings", Object::new(Settings { retries: 3 }))
    .unwrap();
  container
    .register_singleton("tracer", Object::new(String::from("jaeger")))
    .unwrap();
  container.register(Definition::of(new_client)).unwrap();

  // Act
  let client = container.get::<Client>().unwrap();

  // Assert
  assert_eq!(client.settings.retries, 3);
  assert_eq!(client.tracer.as_deref().map(String::as_str), Some("jaeger"));
}

#[test]
fn test_qualifier_selects_among_candidates() {
  #[derive(Debug)]
  struct Report {
    plugin: Arc<dyn Plugin>,
  }

  // Arrange
  let container = Container::new();
  container
    .register(Definition::interface(new_audit_plugin).named("audit"))
    .unwrap();
  container
    .register(Definition::interface(new_metrics_plugin).named("metrics"))
    .unwrap();
  container
    .register(
      Definition::of(|plugin: Arc<dyn Plugin>| Report { plugin })
        .named("byIndex")
        .qualifier_at(0, "metrics"),
    )
    .unwrap();
  container
    .register(
      Definition::of(|plugin: Arc<dyn Plugin>| Report { plugin })
        .named("byType")
        .qualifier::<dyn Plugin>("audit"),
    )
    .unwrap();
  container
    .register(Definition::of(|plugin: Arc<dyn Plugin>| Report { plugin }).named("unqualified"))
    .unwrap();

  // Act & Assert
  assert_eq!(container.get_named::<Report>("byIndex").unwrap().plugin.id(), "metrics");
  assert_eq!(container.get_named::<Report>("byType").unwrap().plugin.id(), "audit");
  let err = container.get_named::<Report>("unqualified").unwrap_err();
  assert!(err.is_ambiguous());
}

#[test]
fn test_missing_required_argument_propagates() {
  #[derive(Debug)]
  struct Service {
    _repository: Arc<Repository>,
  }

  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|repository: Arc<Repository>| Service {
      _repository: repository,
    }))
    .unwrap();

  // Act
  let err = container.get::<Service>().unwrap_err();

  // Assert: the error names the missing dependency, not the requested object.
  assert!(err.is_not_found());
  assert!(err.to_string().contains("Repository"));
  assert!(!err.to_string().contains("Service"));
}

#[derive(Debug)]
struct Repository;

#[derive(Debug)]
struct Cache {
  _repository: Arc<Repository>,
}

#[derive(Debug)]
struct CachedService {
  cache: Option<Arc<Cache>>,
}

// A cache that exists but needs a repository nobody registered.
fn cache_container(config: ContainerConfig) -> Container {
  let container = Container::with_config(config);
  container
    .register(Definition::of(|repository: Arc<Repository>| Cache {
      _repository: repository,
    }))
    .unwrap();
  container
    .register(Definition::of(|cache: Option<Arc<Cache>>| CachedService { cache }))
    .unwrap();
  container
}

#[test]
fn test_optional_argument_is_absent_when_its_dependency_misses() {
  // Arrange
  let container = cache_container(ContainerConfig::default());

  // Act
  let service = container.get::<CachedService>().unwrap();

  // Assert
  assert!(service.cache.is_none());
}

#[test]
fn test_value_argument_is_defaulted_when_its_dependency_misses() {
  // Arrange
  let container = Container::new();
  container
    .register(Definition::of(|_repository: Arc<Repository>| Settings { retries: 9 }))
    .unwrap();
  container.register(Definition::of(new_client)).unwrap();

  // Act
  let client = container.get::<Client>().unwrap();

  // Assert
  assert_eq!(client.settings, Settings::default());
}

#[test]
fn test_direct_miss_fallback_propagates_a_missing_dependency() {
  // Arrange
  let container =
    cache_container(ContainerConfig::default().with_argument_fallback(ArgumentFallback::DirectMiss));

  // Act
  let err = container.get::<CachedService>().unwrap_err();

  // Assert: the cache exists but cannot be built, which is not "absent".
  assert!(matches!(err, Error::NotFound { .. }));
  assert!(err.to_string().contains("Repository"));
}

#[test]
fn test_direct_miss_fallback_still_substitutes_own_misses() {
  // Arrange
  let container = Container::with_config(
    ContainerConfig::default().with_argument_fallback(ArgumentFallback::DirectMiss),
  );
  container.register(Definition::of(new_client)).unwrap();

  // Act
  let client = container.get::<Client>().unwrap();

  // Assert
  assert_eq!(client.settings, Settings::default());
  assert!(client.tracer.is_none());
}

#[test]
fn test_optional_qualified_argument_is_absent_when_the_name_is_missing() {
  struct Service {
    cache: Option<Arc<String>>,
  }

  // Arrange
  let container = Container::new();
  container
    .register_singleton("otherCache", Object::new(String::from("other")))
    .unwrap();
  container
    .register(
      Definition::of(|cache: Option<Arc<String>>| Service { cache }).qualifier_at(0, "cache"),
    )
    .unwrap();

  // Act
  let service = container.get::<Service>().unwrap();

  // Assert
  assert!(service.cache.is_none());
}

#[test]
fn test_argument_of_the_wrong_type_is_a_mismatch() {
  #[derive(Debug)]
  struct Service;

  // Arrange
  let container = Container::new();
  container
    .register_singleton("port", Object::new(8080u16))
    .unwrap();
  container
    .register(Definition::of(|_: Arc<String>| Service).qualifier_at(0, "port"))
    .unwrap();

  // Act
  let err = container.get::<Service>().unwrap_err();

  // Assert
  assert!(matches!(err, Error::ArgumentMismatch { index: 0, .. }));
}
