//! The fixed population cell backbone.
//!
//! Every trait output is keyed by exactly the backbone's cell ids.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraitModelError};
use crate::models::demographics::{
    Covariate, CovariateLevels, age_band_lower_bound, age_band_upper_bound,
};

/// One (sex, age band, region) combination with its population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Unique cell key
    pub cell_id: String,
    /// Sex label
    pub sex: String,
    /// Age-band label (may include child bands such as `0_17`)
    pub age_band: String,
    /// Region label
    pub region: String,
    /// Population count
    pub pop: f64,
}

impl CovariateLevels for Cell {
    fn level(&self, covariate: Covariate) -> Option<&str> {
        match covariate {
            Covariate::Sex => Some(self.sex.as_str()),
            Covariate::AgeBand => Some(self.age_band.as_str()),
            Covariate::Region => Some(self.region.as_str()),
        }
    }
}

/// Metadata block of the backbone file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BackboneMeta {
    /// When the backbone was generated
    #[serde(rename = "generatedAt", default)]
    pub generated_at: Option<String>,
}

/// The fixed, read-only list of population cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBackbone {
    /// Cells in backbone order
    pub cells: Vec<Cell>,
    /// Backbone metadata
    #[serde(default)]
    pub meta: BackboneMeta,
}

impl CellBackbone {
    /// Create a checked backbone from cells
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        let backbone = Self {
            cells,
            meta: BackboneMeta::default(),
        };
        backbone.check()?;
        Ok(backbone)
    }

    /// Load the backbone from its JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let backbone: Self = serde_json::from_str(&text)?;
        backbone.check()?;
        log::info!(
            "Loaded cell backbone: {} cells from {}",
            backbone.cells.len(),
            path.display()
        );
        Ok(backbone)
    }

    /// Build the backbone from an Arrow batch with `cell_id`, `sex`,
    /// `age_band`, `region` and `pop` columns
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let batch = with_float_population(batch)?;
        let cells: Vec<Cell> = serde_arrow::from_record_batch(&batch)
            .map_err(|e| TraitModelError::ConversionError(format!("cell backbone: {e}")))?;
        Self::new(cells)
    }

    /// Reject duplicate ids, negative or non-finite populations and
    /// age-band labels without a numeric lower bound
    pub fn check(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        let mut problems = Vec::new();
        for cell in &self.cells {
            if !ids.insert(cell.cell_id.as_str()) {
                problems.push(format!("duplicate cell id {}", cell.cell_id));
            }
            if !cell.pop.is_finite() || cell.pop < 0.0 {
                problems.push(format!("cell {} has invalid population {}", cell.cell_id, cell.pop));
            }
            if age_band_lower_bound(&cell.age_band).is_none()
                || age_band_upper_bound(&cell.age_band).is_none()
            {
                problems.push(format!(
                    "cell {} has unparseable age band '{}'",
                    cell.cell_id, cell.age_band
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TraitModelError::ConversionError(format!(
                "invalid cell backbone: {}",
                problems.join("; ")
            )))
        }
    }

    /// Set of cell ids
    #[must_use]
    pub fn ids(&self) -> BTreeSet<&str> {
        self.cells.iter().map(|c| c.cell_id.as_str()).collect()
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the backbone has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Replace an integer `pop` column with its `Float64` cast
fn with_float_population(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let Ok(idx) = schema.index_of("pop") else {
        return Ok(batch.clone());
    };
    if schema.field(idx).data_type() == &DataType::Float64 {
        return Ok(batch.clone());
    }
    let mut fields: Vec<Arc<Field>> = schema.fields().iter().cloned().collect();
    fields[idx] = Arc::new(Field::new("pop", DataType::Float64, true));
    let mut columns = batch.columns().to_vec();
    columns[idx] = arrow::compute::cast(batch.column(idx), &DataType::Float64)?;
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// The set of cells a trait applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Universe {
    /// Minimum age of the universe
    pub min_age: u32,
}

impl Universe {
    /// Universe starting at `min_age`
    #[must_use]
    pub const fn new(min_age: u32) -> Self {
        Self { min_age }
    }

    /// Whether any age of the cell's band reaches the minimum age
    ///
    /// A band straddling `min_age` is in the universe; respondents are
    /// filtered by exact age where the survey records it.
    #[must_use]
    pub fn contains(&self, cell: &Cell) -> bool {
        age_band_upper_bound(&cell.age_band).is_some_and(|upper| upper >= self.min_age)
    }
}
