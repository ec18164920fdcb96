//! Sheet resolution: bind each category to its worksheet

use tracing::{debug, info};

use crate::core::schema::SchemaAdapter;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{Category, Table};

/// The two category tables of one uploaded workbook
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSheets {
    pub honorarios: Table,
    pub activos: Table,
    /// Every sheet name present in the source workbook, in workbook order
    pub found_sheets: Vec<String>,
}

impl ResolvedSheets {
    pub fn table(&self, category: Category) -> &Table {
        match category {
            Category::Honorarios => &self.honorarios,
            Category::Activos => &self.activos,
        }
    }

    pub fn table_mut(&mut self, category: Category) -> &mut Table {
        match category {
            Category::Honorarios => &mut self.honorarios,
            Category::Activos => &mut self.activos,
        }
    }
}

/// Pick the sheet for each category and normalize it.
///
/// A sheet matches when its name, uppercased, equals the category's sheet
/// literal (trailing space included). HONORARIOS is resolved first, so it is
/// the role reported when both are missing.
pub fn resolve_sheets(
    tables: Vec<Table>,
    adapter: &dyn SchemaAdapter,
) -> RegistryResult<ResolvedSheets> {
    let found_sheets: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();

    let honorarios_idx = find_sheet(&tables, Category::Honorarios)?;
    let activos_idx = find_sheet(&tables, Category::Activos)?;

    let mut slots: Vec<Option<Table>> = tables.into_iter().map(Some).collect();
    let mut honorarios = take_slot(&mut slots, honorarios_idx, Category::Honorarios)?;
    let mut activos = take_slot(&mut slots, activos_idx, Category::Activos)?;

    adapter.normalize(&mut honorarios);
    adapter.normalize(&mut activos);

    info!("Found sheets: {}", found_sheets.join(", "));

    Ok(ResolvedSheets {
        honorarios,
        activos,
        found_sheets,
    })
}

fn find_sheet(tables: &[Table], category: Category) -> RegistryResult<usize> {
    let expected = category.sheet_name();
    let idx = tables
        .iter()
        .position(|t| t.name.to_uppercase() == expected)
        .ok_or_else(|| RegistryError::MissingSheet {
            role: category.as_str().to_string(),
        })?;
    debug!(category = %category, sheet = %tables[idx].name, "resolved sheet");
    Ok(idx)
}

fn take_slot(
    slots: &mut [Option<Table>],
    idx: usize,
    category: Category,
) -> RegistryResult<Table> {
    slots
        .get_mut(idx)
        .and_then(Option::take)
        .ok_or_else(|| RegistryError::MissingSheet {
            role: category.as_str().to_string(),
        })
}
