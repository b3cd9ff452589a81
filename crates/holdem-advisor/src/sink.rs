use anyhow::Result;
use parking_lot::Mutex;
use tracing::info;

/// Where rendered advice goes. Implementations that own a UI run their own
/// event loop; `render` only hands over the text.
pub trait OutputSink: Send + Sync {
    fn render(&self, payload: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn render(&self, payload: &str) -> Result<()> {
        println!("{}", payload);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn render(&self, payload: &str) -> Result<()> {
        info!(target: "holdem_advisor::output", "{}", payload);
        Ok(())
    }
}

/// Keeps every payload in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl OutputSink for MemorySink {
    fn render(&self, payload: &str) -> Result<()> {
        self.lines.lock().push(payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.render("first").unwrap();
        sink.render("second").unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_stateless_sinks_accept_payloads() {
        let sinks: Vec<Box<dyn OutputSink>> = vec![Box::new(ConsoleSink), Box::new(TracingSink)];
        for sink in &sinks {
            sink.render("[t1] review (confidence 0.90)").unwrap();
            sink.render("").unwrap();
        }
    }
}
