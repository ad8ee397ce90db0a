use fibre_component::{resolve, Container, Definition};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

fn new_console_logger() -> Arc<dyn Logger> {
  Arc::new(ConsoleLogger)
}

// 3. Define a component that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

// The constructor declares its dependency; the container supplies it.
fn new_report_service(logger: Arc<dyn Logger>) -> ReportService {
  ReportService { logger }
}

fn main() -> fibre_component::Result<()> {
  let container = Container::new();

  // --- Registration ---
  // The constructor returns `Arc<dyn Logger>`, so the component is served by trait.
  container.register(Definition::interface(new_console_logger))?;
  container.register(Definition::of(new_report_service))?;

  // --- Resolution and Usage ---
  println!("Resolving the high-level component...");
  let report_service = resolve!(container, ReportService)?;

  println!("Using the component...");
  report_service.generate_report();

  Ok(())
}
