use fibre_component::{resolve, Container, Definition, PROTOTYPE};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple component that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn new_request_tracker() -> RequestTracker {
  RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  }
}

fn main() -> fibre_component::Result<()> {
  let container = Container::new();

  // --- Singleton Registration ---
  // This constructor will only be called ONCE.
  container.register(Definition::of(new_request_tracker).named("singletonTracker"))?;

  // --- Prototype Registration ---
  // This constructor will be called EVERY time the component is resolved.
  container.register(
    Definition::of(new_request_tracker)
      .named("prototypeTracker")
      .scoped(PROTOTYPE),
  )?;

  println!("--- Resolving Singletons ---");
  let s1 = resolve!(container, RequestTracker, "singletonTracker")?;
  let s2 = resolve!(container, RequestTracker, "singletonTracker")?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, 0);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton objects should be identical");
  println!("Singleton objects are the same pointer, as expected.\n");

  println!("--- Resolving Prototypes ---");
  let p1 = resolve!(container, RequestTracker, "prototypeTracker")?;
  let p2 = resolve!(container, RequestTracker, "prototypeTracker")?;
  println!("Prototype 1 ID: {}, Prototype 2 ID: {}", p1.id, p2.id);
  assert_eq!(p1.id, 1);
  assert_eq!(p2.id, 2);
  assert!(!Arc::ptr_eq(&p1, &p2), "Prototype objects should be different");
  println!("Prototype objects are different pointers, as expected.");

  Ok(())
}
