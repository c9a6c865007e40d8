use crate::models::{ControlStateTable, Table, TelemetryRecordTable};

pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    /// Orders `tables` so every table is created after the tables it depends on.
    ///
    /// Panics when a dependency is missing or circular; the table set is fixed at
    /// compile time, so this is a programming error.
    pub fn new(tables: Vec<Box<dyn Table>>) -> Self {
        let mut pending: Vec<Option<Box<dyn Table>>> = tables.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(pending.len());

        for index in 0..pending.len() {
            Self::visit(index, &mut pending, &mut ordered, &mut Vec::new());
        }

        Self { tables: ordered }
    }

    fn visit(
        index: usize,
        pending: &mut [Option<Box<dyn Table>>],
        ordered: &mut Vec<Box<dyn Table>>,
        path: &mut Vec<&'static str>,
    ) {
        let Some(table) = pending[index].take() else {
            return;
        };
        let name = table.name();
        path.push(name);

        for dependency in table.dependencies() {
            if ordered.iter().any(|created| created.name() == dependency) {
                continue;
            }

            let Some(next) = pending
                .iter()
                .position(|t| t.as_ref().is_some_and(|t| t.name() == dependency))
            else {
                panic!(
                    "table `{name}` depends on `{dependency}`, which is unknown or circular ({})",
                    path.join(" -> ")
                );
            };

            Self::visit(next, pending, ordered, path);
        }

        path.pop();
        ordered.push(table);
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(
            vec![
                Box::new(ControlStateTable),
                Box::new(TelemetryRecordTable),
            ]
        )
    }
}
