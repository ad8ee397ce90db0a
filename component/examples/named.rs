use fibre_component::{resolve, Container, Definition};
use std::sync::Arc;

// --- Abstraction and Implementations ---
trait MessageSender: std::fmt::Debug + Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

#[derive(Debug)]
struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

#[derive(Debug)]
struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

// A component wired to one specific sender through a qualifier.
struct Alerts {
  sender: Arc<dyn MessageSender>,
}

fn main() -> fibre_component::Result<()> {
  let container = Container::new();

  // --- Registration ---
  // Both implementations provide the same trait under different names.
  container.register(
    Definition::of(|| EmailSender)
      .named("email")
      .implements::<dyn MessageSender>(|it| it as Arc<dyn MessageSender>),
  )?;
  container.register(
    Definition::of(|| SmsSender)
      .named("sms")
      .implements::<dyn MessageSender>(|it| it as Arc<dyn MessageSender>),
  )?;
  container.register(
    Definition::of(|sender: Arc<dyn MessageSender>| Alerts { sender }).qualifier_at(0, "sms"),
  )?;

  // --- Resolution ---
  // Choose the implementation at the point of resolution...
  let email_notifier = resolve!(container, trait MessageSender, "email")?;
  let result1 = email_notifier.send("test@example.com", "Hello from Fibre!");
  println!("{}", result1);
  assert!(result1.contains("email"));

  // ...or at the point of declaration.
  let alerts = resolve!(container, Alerts)?;
  let result2 = alerts.sender.send("+123456789", "Hello from Fibre!");
  println!("{}", result2);
  assert!(result2.contains("SMS"));

  // Without a name the trait lookup is ambiguous.
  let err = resolve!(container, trait MessageSender).unwrap_err();
  println!("Unqualified lookup: {}", err);
  assert!(err.is_ambiguous());

  Ok(())
}
