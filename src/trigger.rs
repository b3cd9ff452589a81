use holdem_advisor::TriggerKind;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upgrade-only trigger flag for one table.
///
/// Any thread may raise it; only the monitor reads and clears it.
#[derive(Debug, Default)]
pub struct PendingTrigger(AtomicU8);

impl PendingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise to `kind` unless something of higher precedence is already pending.
    pub fn raise(&self, kind: TriggerKind) {
        self.0.fetch_max(kind.as_u8(), Ordering::AcqRel);
    }

    pub fn peek(&self) -> TriggerKind {
        TriggerKind::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Drop a pending explicit request, leaving a detected change in place.
    /// Returns whether a request was dropped.
    pub fn clear_explicit(&self) -> bool {
        self.0
            .compare_exchange(
                TriggerKind::Explicit.as_u8(),
                TriggerKind::None.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Clear the flag, returning what was pending.
    pub fn take(&self) -> TriggerKind {
        TriggerKind::from_u8(self.0.swap(TriggerKind::None.as_u8(), Ordering::AcqRel))
    }
}

/// Per-table trigger flags shared with out-of-band listeners.
#[derive(Debug, Default)]
pub struct TriggerBoard {
    flags: RwLock<HashMap<String, Arc<PendingTrigger>>>,
}

impl TriggerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag for `table`, created on first use.
    pub fn handle(&self, table: &str) -> Arc<PendingTrigger> {
        if let Some(flag) = self.flags.read().get(table) {
            return flag.clone();
        }
        self.flags
            .write()
            .entry(table.to_string())
            .or_default()
            .clone()
    }

    pub fn fire(&self, table: &str, kind: TriggerKind) {
        self.handle(table).raise(kind);
    }

    /// Raise `kind` on every known table, returning how many were raised.
    pub fn fire_all(&self, kind: TriggerKind) -> usize {
        let flags = self.flags.read();
        for flag in flags.values() {
            flag.raise(kind);
        }
        flags.len()
    }

    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.flags.read().keys().cloned().collect();
        tables.sort();
        tables
    }

    /// Drop flags of tables that are no longer visible.
    pub fn retain(&self, visible: &[String]) {
        self.flags.write().retain(|table, _| visible.contains(table));
    }
}

/// Apply one line typed by the operator: empty fires every table, otherwise
/// the named one.
pub fn handle_command(board: &TriggerBoard, line: &str) {
    let name = line.trim();
    if name.is_empty() {
        let count = board.fire_all(TriggerKind::Explicit);
        info!("Explicit request for {} table(s)", count);
    } else if board.tables().iter().any(|t| t == name) {
        board.fire(name, TriggerKind::Explicit);
        info!(table = %name, "Explicit request");
    } else {
        warn!("Unknown table '{}'; known: {:?}", name, board.tables());
    }
}

/// Treat each line on stdin as a hotkey press.
pub fn spawn_stdin_listener(board: Arc<TriggerBoard>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => handle_command(&board, &line),
                Err(e) => {
                    warn!("Stdin listener stopped: {}", e);
                    break;
                }
            }
        }
        debug!("Stdin closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_upgrade_only() {
        let flag = PendingTrigger::new();
        assert_eq!(flag.peek(), TriggerKind::None);

        flag.raise(TriggerKind::Explicit);
        flag.raise(TriggerKind::ChangeDetected);
        assert_eq!(flag.peek(), TriggerKind::Explicit);

        assert_eq!(flag.take(), TriggerKind::Explicit);
        assert_eq!(flag.peek(), TriggerKind::None);

        flag.raise(TriggerKind::ChangeDetected);
        flag.raise(TriggerKind::None);
        assert_eq!(flag.take(), TriggerKind::ChangeDetected);
    }

    #[test]
    fn test_clear_explicit_keeps_detected_change() {
        let flag = PendingTrigger::new();
        flag.raise(TriggerKind::ChangeDetected);
        assert!(!flag.clear_explicit());
        assert_eq!(flag.peek(), TriggerKind::ChangeDetected);

        flag.raise(TriggerKind::Explicit);
        assert!(flag.clear_explicit());
        assert_eq!(flag.peek(), TriggerKind::None);
    }

    #[test]
    fn test_handle_is_shared() {
        let board = TriggerBoard::new();
        let flag = board.handle("t1");
        board.fire("t1", TriggerKind::Explicit);
        assert_eq!(flag.peek(), TriggerKind::Explicit);
        assert!(Arc::ptr_eq(&flag, &board.handle("t1")));
    }

    #[test]
    fn test_raised_from_another_thread() {
        let board = Arc::new(TriggerBoard::new());
        let flag = board.handle("t1");
        let remote = board.clone();
        std::thread::spawn(move || remote.fire("t1", TriggerKind::Explicit))
            .join()
            .unwrap();
        assert_eq!(flag.take(), TriggerKind::Explicit);
    }

    #[test]
    fn test_commands() {
        let board = TriggerBoard::new();
        let a = board.handle("a");
        let b = board.handle("b");

        handle_command(&board, "b\n");
        assert_eq!(a.peek(), TriggerKind::None);
        assert_eq!(b.peek(), TriggerKind::Explicit);

        handle_command(&board, "zzz");
        assert_eq!(board.tables(), vec!["a", "b"]);

        handle_command(&board, "");
        assert_eq!(a.peek(), TriggerKind::Explicit);
    }

    #[test]
    fn test_retain_drops_missing_tables() {
        let board = TriggerBoard::new();
        board.handle("a");
        board.handle("b");
        board.retain(&["b".to_string()]);
        assert_eq!(board.tables(), vec!["b"]);
    }
}
