//! Database API - high-level interface for memkv.

use thiserror::Error;

use crate::command::{Command, ParseError, Parser};
use crate::storage::{Key, Store, Value};
use crate::transaction::{Change, TransactionError, TransactionStack};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Database configuration options.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Echo every executed line and ignored parse error to stderr.
    pub verbose: bool,
}

impl DatabaseConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }
}

/// The outcome of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command executed with nothing to print.
    None,
    /// GET result; `None` renders as `NULL`.
    Value(Option<Value>),
    /// NUMEQUALTO result.
    Count(usize),
    /// ROLLBACK or COMMIT with no open transaction.
    NoTransaction,
    /// END: the caller should stop its request loop.
    Exit,
}

impl Response {
    /// The line to print for this response, if any.
    pub fn render(&self) -> Option<String> {
        match self {
            Response::None | Response::Exit => None,
            Response::Value(Some(value)) => Some(value.to_string()),
            Response::Value(None) => Some("NULL".to_string()),
            Response::Count(n) => Some(n.to_string()),
            Response::NoTransaction => Some("NO TRANSACTION".to_string()),
        }
    }
}

/// The main database handle.
///
/// Composes the base [`Store`] with the [`TransactionStack`]: every read
/// consults the innermost transaction layers before falling through to
/// committed state, and every write lands in the innermost layer while a
/// transaction is open. Single-threaded; see
/// [`SharedDatabase`](crate::db::SharedDatabase) for multi-caller access.
#[derive(Debug, Default)]
pub struct Database {
    config: DatabaseConfig,
    store: Store,
    transactions: TransactionStack,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database with custom configuration.
    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Assign `value` to `key`.
    ///
    /// With a transaction open the write is recorded in the innermost layer,
    /// using the currently effective value as the layer's baseline for count
    /// bookkeeping. Otherwise the base store is updated directly.
    pub fn set(&mut self, key: Key, value: Value) {
        if self.transactions.is_active() {
            let visible = self.get(&key).cloned();
            self.transactions.set(key, value, visible.as_ref());
        } else {
            let old = self.store.get(&key).cloned();
            self.store.apply_count_delta(old.as_ref(), Some(&value));
            self.store.set(key, value);
        }
    }

    /// The effective value of `key`: innermost transaction layer first,
    /// then committed state. `None` when absent or effectively unset.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self.transactions.lookup(key) {
            Some(effective) => effective,
            None => self.store.get(key),
        }
    }

    /// Remove `key`. Unsetting an absent key is a well-defined no-op.
    pub fn unset(&mut self, key: &Key) {
        let Some(current) = self.get(key).cloned() else {
            return;
        };
        if self.transactions.is_active() {
            self.transactions.unset(key.clone(), &current);
        } else {
            self.store.apply_count_delta(Some(&current), None);
            self.store.unset(key);
        }
    }

    /// Number of keys currently holding `value`, transaction layers
    /// included. Zero, never an absence marker, when nothing matches.
    pub fn num_equal_to(&self, value: &Value) -> usize {
        let count =
            self.store.value_count(value) as i64 + self.transactions.net_value_count(value);
        debug_assert!(count >= 0, "value count for {value} went negative");
        count.max(0) as usize
    }

    /// Open a new transaction. Always succeeds; nesting is unbounded.
    pub fn begin(&mut self) {
        self.transactions.begin();
    }

    /// Discard the innermost transaction.
    pub fn rollback(&mut self) -> DatabaseResult<()> {
        Ok(self.transactions.rollback()?)
    }

    /// Fold every open layer's net changes into the base store, then close
    /// all transactions. This is the only path by which transaction state
    /// becomes visible in committed state.
    pub fn commit(&mut self) -> DatabaseResult<()> {
        Ok(self.commit_fold()?)
    }

    fn commit_fold(&mut self) -> Result<(), TransactionError> {
        if !self.transactions.is_active() {
            return Err(TransactionError::NoActiveTransaction);
        }

        // Inner layers already override outer ones in the merged change set,
        // and folding is commutative per key, so a single unordered pass
        // suffices. The count-delta baseline is re-read from the store here:
        // a change's recorded old value may be an intermediate transaction
        // value, not the committed one.
        for (key, change) in self.transactions.collect_net_changes() {
            let old = self.store.get(&key).cloned();
            match change {
                Change::Set { new, .. } => {
                    self.store.apply_count_delta(old.as_ref(), Some(&new));
                    self.store.set(key, new);
                }
                Change::Unset { .. } => {
                    self.store.apply_count_delta(old.as_ref(), None);
                    self.store.unset(&key);
                }
            }
        }

        self.transactions.clear();
        Ok(())
    }

    /// True iff a transaction is open.
    pub fn is_in_transaction(&self) -> bool {
        self.transactions.is_active()
    }

    /// Current transaction nesting depth.
    pub fn transaction_depth(&self) -> usize {
        self.transactions.depth()
    }

    /// Execute one command line.
    ///
    /// Transaction-state violations surface as [`Response::NoTransaction`]
    /// (a printable condition, not a failure). Parse errors are returned so
    /// the request loop can drop them per the grammar.
    pub fn execute(&mut self, line: &str) -> DatabaseResult<Response> {
        if self.config.verbose {
            eprintln!("[cmd] {}", line);
        }

        let command = Parser::parse(line)?;
        Ok(self.run(command))
    }

    /// Execute an already-parsed command.
    pub fn run(&mut self, command: Command) -> Response {
        match command {
            Command::Set { key, value } => {
                self.set(key, value);
                Response::None
            }
            Command::Get { key } => Response::Value(self.get(&key).cloned()),
            Command::Unset { key } => {
                self.unset(&key);
                Response::None
            }
            Command::NumEqualTo { value } => Response::Count(self.num_equal_to(&value)),
            Command::Begin => {
                self.begin();
                Response::None
            }
            Command::Rollback => match self.transactions.rollback() {
                Ok(()) => Response::None,
                Err(TransactionError::NoActiveTransaction) => Response::NoTransaction,
            },
            Command::Commit => match self.commit_fold() {
                Ok(()) => Response::None,
                Err(TransactionError::NoActiveTransaction) => Response::NoTransaction,
            },
            Command::End => Response::Exit,
        }
    }

    /// Execute multiple lines, stopping at END.
    ///
    /// Blank and unrecognized lines are silently skipped per the grammar.
    pub fn execute_script(&mut self, input: &str) -> Vec<Response> {
        let mut responses = Vec::new();
        for line in input.lines() {
            match self.execute(line) {
                Ok(Response::Exit) => {
                    responses.push(Response::Exit);
                    break;
                }
                Ok(response) => responses.push(response),
                // Only parse errors reach here; run() folds transaction
                // errors into responses.
                Err(e) => {
                    if self.config.verbose {
                        eprintln!("[ignored] {}", e);
                    }
                }
            }
        }
        responses
    }

    /// Execute a closure between BEGIN and COMMIT, rolling back the
    /// innermost transaction when it errors.
    pub fn transaction<F, T>(&mut self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Self) -> DatabaseResult<T>,
    {
        self.begin();
        match f(self) {
            Ok(result) => {
                self.commit()?;
                Ok(result)
            }
            Err(e) => {
                self.rollback()?;
                Err(e)
            }
        }
    }

    /// Get database statistics.
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            keys: self.store.len(),
            distinct_values: self.store.distinct_values(),
            transaction_depth: self.transactions.depth(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of committed keys.
    pub keys: usize,
    /// Number of distinct committed values.
    pub distinct_values: usize,
    /// Current transaction nesting depth.
    pub transaction_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn k(s: &str) -> Key {
        Key::new(s)
    }

    fn v(s: &str) -> Value {
        Value::new(s)
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut db = Database::new();
        db.set(k("a"), v("10"));
        assert_eq!(db.get(&k("a")), Some(&v("10")));
        assert_eq!(db.get(&k("missing")), None);
    }

    #[test]
    fn test_unset_absent_key_is_noop() {
        let mut db = Database::new();
        db.set(k("a"), v("10"));
        let before = db.num_equal_to(&v("10"));
        db.unset(&k("missing"));
        assert_eq!(db.num_equal_to(&v("10")), before);
        assert_eq!(db.stats().keys, 1);
    }

    #[test]
    fn test_num_equal_to_tracks_overwrites() {
        let mut db = Database::new();
        db.set(k("a"), v("10"));
        db.set(k("b"), v("10"));
        assert_eq!(db.num_equal_to(&v("10")), 2);

        db.set(k("b"), v("30"));
        assert_eq!(db.num_equal_to(&v("10")), 1);
        assert_eq!(db.num_equal_to(&v("30")), 1);
    }

    #[test]
    fn test_nested_rollback_restores_outer_layer() {
        let mut db = Database::new();
        db.begin();
        db.set(k("a"), v("A"));
        db.begin();
        db.set(k("a"), v("B"));
        db.rollback().unwrap();
        assert_eq!(db.get(&k("a")), Some(&v("A")));
    }

    #[test]
    fn test_commit_folds_all_layers() {
        let mut db = Database::new();
        db.begin();
        db.set(k("a"), v("A"));
        db.begin();
        db.set(k("a"), v("B"));
        db.commit().unwrap();

        assert_eq!(db.get(&k("a")), Some(&v("B")));
        assert!(!db.is_in_transaction());
        assert_eq!(
            db.rollback(),
            Err(DatabaseError::Transaction(
                TransactionError::NoActiveTransaction
            ))
        );
    }

    #[test]
    fn test_rollback_and_commit_on_fresh_store() {
        let mut db = Database::new();
        assert_eq!(
            db.rollback(),
            Err(DatabaseError::Transaction(
                TransactionError::NoActiveTransaction
            ))
        );
        assert_eq!(
            db.commit(),
            Err(DatabaseError::Transaction(
                TransactionError::NoActiveTransaction
            ))
        );

        // Still queryable and unchanged.
        assert_eq!(db.get(&k("a")), None);
        assert_eq!(db.num_equal_to(&v("10")), 0);
    }

    #[test]
    fn test_unset_inside_nested_transaction() {
        let mut db = Database::new();
        db.set(k("a"), v("50"));
        db.begin();
        db.set(k("a"), v("60"));
        db.begin();
        db.unset(&k("a"));
        assert_eq!(db.get(&k("a")), None);

        db.rollback().unwrap();
        assert_eq!(db.get(&k("a")), Some(&v("60")));

        db.commit().unwrap();
        assert_eq!(db.get(&k("a")), Some(&v("60")));
    }

    #[test]
    fn test_counts_follow_transaction_layers() {
        let mut db = Database::new();
        db.set(k("a"), v("10"));
        db.begin();
        assert_eq!(db.num_equal_to(&v("10")), 1);
        db.begin();
        db.unset(&k("a"));
        assert_eq!(db.num_equal_to(&v("10")), 0);
        db.rollback().unwrap();
        assert_eq!(db.num_equal_to(&v("10")), 1);
        db.commit().unwrap();
        assert_eq!(db.num_equal_to(&v("10")), 1);
    }

    #[test]
    fn test_commit_of_unset_key_set_within_transaction() {
        // The key never existed in committed state; a committed unset must
        // leave both the store and the count index clean.
        let mut db = Database::new();
        db.set(k("a"), v("50"));
        db.begin();
        db.set(k("b"), v("50"));
        db.begin();
        db.unset(&k("b"));
        db.commit().unwrap();

        assert_eq!(db.get(&k("b")), None);
        assert_eq!(db.num_equal_to(&v("50")), 1);
        assert_eq!(db.stats().keys, 1);
    }

    #[test]
    fn test_commit_after_unset_of_transaction_value() {
        // Set inside a transaction, then unset, then commit: the committed
        // count for the pre-transaction value must drop to zero.
        let mut db = Database::new();
        db.set(k("a"), v("50"));
        db.begin();
        db.set(k("a"), v("60"));
        db.unset(&k("a"));
        db.commit().unwrap();

        assert_eq!(db.get(&k("a")), None);
        assert_eq!(db.num_equal_to(&v("50")), 0);
        assert_eq!(db.num_equal_to(&v("60")), 0);
        assert_eq!(db.stats().keys, 0);
    }

    #[test]
    fn test_same_key_rewritten_within_one_layer() {
        let mut db = Database::new();
        db.set(k("a"), v("1"));
        db.begin();
        db.set(k("a"), v("2"));
        db.set(k("a"), v("3"));
        assert_eq!(db.num_equal_to(&v("1")), 0);
        assert_eq!(db.num_equal_to(&v("2")), 0);
        assert_eq!(db.num_equal_to(&v("3")), 1);

        db.rollback().unwrap();
        assert_eq!(db.get(&k("a")), Some(&v("1")));
        assert_eq!(db.num_equal_to(&v("1")), 1);
    }

    #[test]
    fn test_execute_full_session() {
        let mut db = Database::new();
        let responses = db.execute_script(
            "SET a 10\n\
             SET b 10\n\
             NUMEQUALTO 10\n\
             BEGIN\n\
             UNSET a\n\
             GET a\n\
             ROLLBACK\n\
             GET a\n\
             COMMIT\n\
             END",
        );

        assert_eq!(
            responses,
            vec![
                Response::None,
                Response::None,
                Response::Count(2),
                Response::None,
                Response::None,
                Response::Value(None),
                Response::None,
                Response::Value(Some(v("10"))),
                Response::NoTransaction,
                Response::Exit,
            ]
        );
    }

    #[test]
    fn test_execute_ignores_garbage_lines() {
        let mut db = Database::new();
        let responses = db.execute_script("\nFROB a\nSET a\nSET a 10\nGET a");
        assert_eq!(
            responses,
            vec![Response::None, Response::Value(Some(v("10")))]
        );
    }

    #[test]
    fn test_response_render() {
        assert_eq!(Response::None.render(), None);
        assert_eq!(Response::Exit.render(), None);
        assert_eq!(Response::Value(Some(v("10"))).render(), Some("10".into()));
        assert_eq!(Response::Value(None).render(), Some("NULL".into()));
        assert_eq!(Response::Count(3).render(), Some("3".into()));
        assert_eq!(
            Response::NoTransaction.render(),
            Some("NO TRANSACTION".into())
        );
    }

    #[test]
    fn test_transaction_closure_commits() {
        let mut db = Database::new();
        db.transaction(|db| {
            db.set(k("a"), v("1"));
            db.set(k("b"), v("1"));
            Ok(())
        })
        .unwrap();

        assert!(!db.is_in_transaction());
        assert_eq!(db.num_equal_to(&v("1")), 2);
    }

    #[test]
    fn test_transaction_closure_rolls_back_on_error() {
        let mut db = Database::new();
        let result: DatabaseResult<()> = db.transaction(|db| {
            db.set(k("a"), v("1"));
            Err(DatabaseError::Parse(ParseError::EmptyLine))
        });

        assert!(result.is_err());
        assert!(!db.is_in_transaction());
        assert_eq!(db.get(&k("a")), None);
    }

    // Reference model for the property test below: a stack of full map
    // snapshots. Begin clones the current view, rollback pops it, commit
    // collapses the stack to the current view. Obviously correct, if slow.
    #[derive(Clone, Debug)]
    struct ModelDb {
        snapshots: Vec<std::collections::HashMap<String, String>>,
    }

    impl ModelDb {
        fn new() -> Self {
            Self {
                snapshots: vec![std::collections::HashMap::new()],
            }
        }

        fn current(&mut self) -> &mut std::collections::HashMap<String, String> {
            self.snapshots.last_mut().expect("always one snapshot")
        }

        fn view(&self) -> &std::collections::HashMap<String, String> {
            self.snapshots.last().expect("always one snapshot")
        }

        fn begin(&mut self) {
            self.snapshots.push(self.view().clone());
        }

        fn rollback(&mut self) {
            if self.snapshots.len() > 1 {
                self.snapshots.pop();
            }
        }

        fn commit(&mut self) {
            if self.snapshots.len() > 1 {
                let current = self.snapshots.pop().expect("always one snapshot");
                self.snapshots = vec![current];
            }
        }

        fn count(&self, value: &str) -> usize {
            self.view().values().filter(|x| x.as_str() == value).count()
        }
    }

    #[derive(Clone, Debug)]
    enum Op {
        Set(String, String),
        Unset(String),
        Begin,
        Rollback,
        Commit,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let key = prop::sample::select(vec!["a", "b", "c", "d"]);
        let value = prop::sample::select(vec!["1", "2", "3"]);
        prop_oneof![
            4 => (key.clone(), value).prop_map(|(k, v)| Op::Set(k.into(), v.into())),
            2 => key.prop_map(|k| Op::Unset(k.into())),
            1 => Just(Op::Begin),
            1 => Just(Op::Rollback),
            1 => Just(Op::Commit),
        ]
    }

    proptest! {
        // At every point, in or out of a transaction, num_equal_to(v) must
        // equal the number of keys whose effective value is v.
        #[test]
        fn prop_count_invariant_holds(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut db = Database::new();
            let mut model = ModelDb::new();

            for op in ops {
                match op {
                    Op::Set(key, value) => {
                        db.set(k(&key), v(&value));
                        model.current().insert(key, value);
                    }
                    Op::Unset(key) => {
                        db.unset(&k(&key));
                        model.current().remove(&key);
                    }
                    Op::Begin => {
                        db.begin();
                        model.begin();
                    }
                    Op::Rollback => {
                        let _ = db.rollback();
                        model.rollback();
                    }
                    Op::Commit => {
                        let _ = db.commit();
                        model.commit();
                    }
                }

                for key in ["a", "b", "c", "d"] {
                    prop_assert_eq!(
                        db.get(&k(key)).map(|x| x.as_str().to_string()),
                        model.view().get(key).cloned()
                    );
                }
                for value in ["1", "2", "3"] {
                    prop_assert_eq!(db.num_equal_to(&v(value)), model.count(value));
                }
            }
        }
    }
}
