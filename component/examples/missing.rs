use fibre_component::{maybe_resolve, resolve, Container, Definition, Value};
use std::sync::Arc;

struct UnregisteredService;

#[derive(Debug, Clone, Default)]
struct RetryPolicy {
  attempts: u32,
}

struct HttpClient {
  retries: RetryPolicy,
  proxy: Option<Arc<String>>,
}

fn new_http_client(retries: Value<RetryPolicy>, proxy: Option<Arc<String>>) -> HttpClient {
  HttpClient {
    retries: retries.into_inner(),
    proxy,
  }
}

fn main() {
  let container = Container::new();

  // --- Resolving something that was never registered ---
  println!("Attempting to resolve a component that was never registered...");
  match resolve!(container, UnregisteredService) {
    Ok(_) => panic!("Should not have found the component!"),
    Err(err) => println!("Correctly received an error: {}", err),
  }
  assert!(maybe_resolve!(container, UnregisteredService).is_none());

  // --- Missing dependencies that have sane defaults ---
  // `Value<T>` falls back to `T::default()` and `Option<Arc<T>>` to `None`.
  if let Err(err) = container.register(Definition::of(new_http_client)) {
    panic!("registration failed: {}", err);
  }

  match resolve!(container, HttpClient) {
    Ok(client) => {
      println!(
        "Built client with {} retries and proxy {:?}",
        client.retries.attempts, client.proxy
      );
      assert_eq!(client.retries.attempts, 0);
      assert!(client.proxy.is_none());
    }
    Err(err) => panic!("Should have built the client: {}", err),
  }
}
