//! Resolution of diagnostics and their requirements.
//!
//! The [`Resolver`] walks the requirements of each requested diagnostic depth-first,
//! computing any requirement that is missing from the dataset before evaluating the
//! diagnostic itself. Fields already present in the dataset are never recomputed
//! when they are needed as a requirement, so intermediate diagnostics are evaluated
//! at most once per dataset.
//!
//! Requested diagnostics are always evaluated, replacing any field of the same name.
//!
//! A failing formula is reported as [`DiagError::Evaluation`], naming the diagnostic
//! being computed. On failure the dataset keeps every diagnostic inserted before the
//! failing one.

use crate::catalogue::Catalogue;
use crate::dataset::{Dataset, DEFAULT_VERTICAL_AXIS};
use crate::errors::{DiagError, DiagResult};
use log::{debug, error, info};

/// Adds diagnostics from a catalogue to datasets.
#[derive(Debug)]
pub struct Resolver<'c> {
    catalogue: &'c Catalogue,
    verbose: bool,
    /// Diagnostics currently being resolved, outermost first
    in_progress: Vec<String>,
}

impl<'c> Resolver<'c> {
    pub fn new(catalogue: &'c Catalogue) -> Self {
        Self {
            catalogue,
            verbose: false,
            in_progress: vec![],
        }
    }

    /// Report every resolution step at `info` level instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Compute the named diagnostics, in order, and insert them into `dataset`.
    ///
    /// Every name is checked against the catalogue before the dataset is modified.
    pub fn add(&mut self, dataset: &mut Dataset, names: &[&str]) -> DiagResult<()> {
        for name in names {
            self.catalogue.lookup(name)?;
        }
        for name in names {
            self.in_progress.clear();
            self.resolve(dataset, name)?;
        }
        Ok(())
    }

    fn resolve(&mut self, dataset: &mut Dataset, name: &str) -> DiagResult<()> {
        let catalogue = self.catalogue;
        let entry = catalogue.lookup(name)?;
        self.in_progress.push(name.to_string());

        for requirement in entry.requirements() {
            let requirement = field_name(dataset, requirement).to_string();
            if dataset.contains(&requirement) {
                continue;
            }
            if self.in_progress.contains(&requirement) {
                let mut chain = self.in_progress.clone();
                chain.push(requirement);
                return Err(DiagError::CyclicRequirement { chain });
            }
            if !catalogue.contains(&requirement) {
                return Err(DiagError::UnresolvableRequirement {
                    requirement,
                    required_by: name.to_string(),
                });
            }
            self.narrate(&format!("Lacking {} to compute {}", requirement, name));
            self.resolve(dataset, &requirement)?;
        }

        let field = entry.evaluate(dataset).map_err(|e| {
            error!("Failed to compute {}: {}", name, e);
            DiagError::Evaluation {
                name: name.to_string(),
                source: Box::new(e),
            }
        })?;
        dataset.insert(name, field.with_attrs(entry.output_metadata().clone()));
        self.narrate(&format!("Added {} : {}", name, entry.description()));

        self.in_progress.pop();
        Ok(())
    }

    fn narrate(&self, message: &str) {
        if self.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }
}

/// Name of the dataset field satisfying a requirement.
///
/// `deptht` is the catalogue's name for the vertical coordinate, whatever the dataset
/// calls it.
fn field_name<'a>(dataset: &'a Dataset, requirement: &'a str) -> &'a str {
    if requirement == DEFAULT_VERTICAL_AXIS {
        dataset.vertical_axis()
    } else {
        requirement
    }
}

/// Add diagnostics from the standard catalogue to a dataset.
///
/// Returns the dataset to allow chaining.
///
/// ```rust,no_run
/// use ocdiag_core::{add, Dataset};
///
/// # fn load() -> Dataset { Dataset::new() }
/// let mut dataset = load();
/// add(&mut dataset, &["NPPOI", "ZooRespI"], true).unwrap();
/// assert!(dataset.contains("NPPO"));
/// ```
pub fn add<'a>(
    dataset: &'a mut Dataset,
    names: &[&str],
    verbose: bool,
) -> DiagResult<&'a mut Dataset> {
    Resolver::new(Catalogue::global())
        .verbose(verbose)
        .add(dataset, names)?;
    Ok(dataset)
}
