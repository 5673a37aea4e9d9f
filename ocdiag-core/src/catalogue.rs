//! Catalogue of derived diagnostics.
//!
//! Each [`CatalogueEntry`] declares the fields it requires, a formula computing the
//! diagnostic from a dataset holding those fields, and the attributes attached to the
//! result. Requirements may be raw model output (e.g. `NPP`, `CHL`), coordinates
//! (e.g. `deptht`) or other diagnostics, which the
//! [`Resolver`](crate::resolver::Resolver) computes first.
//!
//! A requirement on `deptht` stands for the vertical coordinate. Datasets declaring
//! another vertical axis (e.g. `depthw`) satisfy it with that coordinate.
//!
//! The standard catalogue for NEMO-BAMHBI output is built once per process and is
//! available through [`Catalogue::global`]. Custom catalogues can be assembled with
//! [`Catalogue::with_entry`].
//!
//! # Example
//!
//! ```rust
//! use ocdiag_core::catalogue::Catalogue;
//!
//! let entry = Catalogue::global().lookup("NPPO").unwrap();
//! assert_eq!(entry.requirements(), &["NPP", "PhytoNitrateReduction"]);
//! assert_eq!(entry.units(), "mmol O2 m-3 s-1");
//! ```

use crate::dataset::Dataset;
use crate::errors::{DiagError, DiagResult};
use crate::field::{attributes, AttrValue, Attributes, Field};
use crate::operators::{integrate, DepthFilter};
use indexmap::IndexMap;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::visit::{depth_first_search, DfsEvent};
use petgraph::Graph;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Computes a diagnostic from a dataset holding all of its requirements.
pub type Formula = fn(&Dataset) -> DiagResult<Field>;

/// Graph of requirements between catalogue entries.
///
/// An edge `a -> b` means that `b` requires `a`. Raw fields are not part of the graph.
pub type RequirementGraph = Graph<String, ()>;

/// Definition of a single diagnostic.
#[derive(Clone)]
pub struct CatalogueEntry {
    name: String,
    requirements: Vec<String>,
    formula: Formula,
    output_metadata: Attributes,
    description: String,
}

impl CatalogueEntry {
    /// Create a new entry without requirements or metadata.
    pub fn new(name: impl Into<String>, description: impl Into<String>, formula: Formula) -> Self {
        Self {
            name: name.into(),
            requirements: vec![],
            formula,
            output_metadata: Attributes::new(),
            description: description.into(),
        }
    }

    /// Set the fields that must be present before the formula can be evaluated.
    ///
    /// Requirements are resolved in the given order.
    pub fn requires(mut self, names: &[&str]) -> Self {
        self.requirements = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Set the attributes attached to the computed field.
    pub fn with_metadata(mut self, attrs: Attributes) -> Self {
        self.output_metadata = attrs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn output_metadata(&self) -> &Attributes {
        &self.output_metadata
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `units` attribute of the output, or an empty string if undeclared
    pub fn units(&self) -> &str {
        self.output_metadata
            .get("units")
            .and_then(AttrValue::as_text)
            .unwrap_or("")
    }

    /// Evaluate the formula against a dataset.
    pub fn evaluate(&self, dataset: &Dataset) -> DiagResult<Field> {
        (self.formula)(dataset)
    }
}

impl fmt::Debug for CatalogueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogueEntry")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .field("output_metadata", &self.output_metadata)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// An ordered, read-only registry of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: IndexMap<String, CatalogueEntry>,
}

impl Catalogue {
    /// Create an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard diagnostic catalogue.
    pub fn global() -> &'static Catalogue {
        &CATALOGUE
    }

    /// Add an entry, replacing any entry with the same name.
    ///
    /// Returns self for method chaining.
    pub fn with_entry(mut self, entry: CatalogueEntry) -> Self {
        self.entries.insert(entry.name.clone(), entry);
        self
    }

    /// Look up a diagnostic by name.
    pub fn lookup(&self, name: &str) -> DiagResult<&CatalogueEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| DiagError::UnknownDiagnostic {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Diagnostic names in catalogue order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the graph of requirements between diagnostics.
    pub fn dependency_graph(&self) -> RequirementGraph {
        let mut graph = RequirementGraph::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .entries
            .keys()
            .map(|name| (name.as_str(), graph.add_node(name.clone())))
            .collect();

        for entry in self.entries.values() {
            for requirement in &entry.requirements {
                if let Some(&from) = nodes.get(requirement.as_str()) {
                    graph.add_edge(from, nodes[entry.name.as_str()], ());
                }
            }
        }
        graph
    }

    /// Check that the requirements between diagnostics do not form a cycle.
    pub fn validate(&self) -> DiagResult<()> {
        let graph = self.dependency_graph();
        let cycle = depth_first_search(&graph, graph.node_indices(), |event| match event {
            DfsEvent::BackEdge(a, b) => Err((a, b)),
            _ => Ok(()),
        });
        match cycle {
            Err((a, b)) => Err(DiagError::InvalidCatalogue(format!(
                "'{}' and '{}' depend on each other",
                graph[a], graph[b]
            ))),
            Ok(()) => Ok(()),
        }
    }

    /// Render the requirement graph in graphviz dot format.
    pub fn as_dot(&self) -> String {
        let graph = self.dependency_graph();
        format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[Config::NodeNoLabel, Config::EdgeNoLabel],
                &|_, _| String::new(),
                &|_, (_, name)| format!("label = {:?}", name),
            )
        )
    }
}

/// The standard catalogue, built on first use.
pub static CATALOGUE: LazyLock<Catalogue> = LazyLock::new(standard_catalogue);

fn output_attrs(units: &str, long_name: &str, coordinates: &str) -> Attributes {
    attributes([
        ("units", AttrValue::from(units)),
        ("long_name", long_name.into()),
        ("valid_min", (-1e20).into()),
        ("valid_max", 1e20.into()),
        ("cell_methods", "time: mean".into()),
        ("coordinates", coordinates.into()),
    ])
}

fn vertical_integral(dataset: &Dataset, name: &str) -> DiagResult<Field> {
    integrate(dataset, name, &DepthFilter::NoFilter)
}

/// Diagnostics for NEMO-BAMHBI biogeochemical output.
fn standard_catalogue() -> Catalogue {
    Catalogue::new()
        .with_entry(
            CatalogueEntry::new(
                "NPPO",
                "Net phyto impact on Oxygen (ie. Primary production - respiration + nitrate reduction)",
                |ds| ds.sum_of(&["NPP", "PhytoNitrateReduction"]),
            )
            .requires(&["NPP", "PhytoNitrateReduction"])
            .with_metadata(output_attrs("mmol O2 m-3 s-1", "Net Phyto Oxygen", "lon lat deptht")),
        )
        .with_entry(
            CatalogueEntry::new("ZooResp", "Total Zoo and Gel respiration", |ds| {
                ds.sum_of(&["TotalRespiration_Gel", "TotalRespiration_Zoo"])
            })
            .requires(&["TotalRespiration_Zoo", "TotalRespiration_Gel"])
            .with_metadata(output_attrs(
                "mmol O2 m-3 s-1",
                "Zooplankton respiration",
                "lon lat deptht",
            )),
        )
        .with_entry(
            CatalogueEntry::new(
                "DOC",
                "sum of labile and semi-labile dissolved organic matter components",
                |ds| ds.sum_of(&["DCL", "DCS"]),
            )
            .requires(&["DCL", "DCS"])
            .with_metadata(output_attrs("-", "Dissolved Organic Carbon", "lon lat deptht")),
        )
        .with_entry(
            CatalogueEntry::new(
                "ZooRespI",
                "Zooplankton respiration (Gel + Zoo)- Vertical integral",
                |ds| vertical_integral(ds, "ZooResp"),
            )
            .requires(&["deptht", "ZooResp"])
            .with_metadata(output_attrs(
                "-",
                "Total Zooplankton respiration - Vertical integral",
                "lon lat",
            )),
        )
        .with_entry(
            CatalogueEntry::new(
                "NPPOI",
                "Net phyto impact on Oxygen - Vertical integral",
                |ds| vertical_integral(ds, "NPPO"),
            )
            .requires(&["deptht", "NPPO"])
            .with_metadata(output_attrs(
                "-",
                "Net Phyto Oxygen - Vertical integral",
                "lon lat",
            )),
        )
        .with_entry(
            CatalogueEntry::new(
                "OXIDATIONBYDOXI",
                "OXIDATIONBYDOX (nitrification and ODU oxidation) - Vertical integral",
                |ds| vertical_integral(ds, "OXIDATIONBYDOX"),
            )
            .requires(&["deptht", "OXIDATIONBYDOX"])
            .with_metadata(output_attrs(
                "-",
                "OXIDATIONBYDOX - Vertical integral",
                "lon lat",
            )),
        )
        .with_entry(
            CatalogueEntry::new(
                "bac_oxygenconsumptionI",
                "Bacterial Oxygen Consumption - Vertical integral",
                |ds| vertical_integral(ds, "bac_oxygenconsumption"),
            )
            .requires(&["deptht", "bac_oxygenconsumption"])
            .with_metadata(output_attrs(
                "-",
                "Bacterial Oxygen Consumption - Vertical integral",
                "lon lat",
            )),
        )
        .with_entry(
            CatalogueEntry::new("CHLI", "Chlorophyll - vertically integrated", |ds| {
                vertical_integral(ds, "CHL")
            })
            .requires(&["CHL", "deptht"])
            .with_metadata(output_attrs(
                "mg Chl m-2",
                "Chlorophyll - vertically integrated",
                "lon lat",
            )),
        )
        // Sentinel without requirements, evaluating to a single missing value
        .with_entry(
            CatalogueEntry::new("VOID", "", |_| Ok(Field::scalar(f64::NAN)))
                .with_metadata(output_attrs("", "", "lon lat deptht")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(ds: &Dataset) -> DiagResult<Field> {
        ds.sum_of(&["x", "x"])
    }

    #[test]
    fn standard_catalogue_order() {
        let names: Vec<&str> = Catalogue::global().names().collect();
        assert_eq!(
            names,
            vec![
                "NPPO",
                "ZooResp",
                "DOC",
                "ZooRespI",
                "NPPOI",
                "OXIDATIONBYDOXI",
                "bac_oxygenconsumptionI",
                "CHLI",
                "VOID"
            ]
        );
    }

    #[test]
    fn standard_catalogue_is_valid() {
        Catalogue::global().validate().unwrap();
    }

    #[test]
    fn every_entry_declares_standard_metadata() {
        for entry in Catalogue::global().entries() {
            let attrs = entry.output_metadata();
            for key in [
                "units",
                "long_name",
                "valid_min",
                "valid_max",
                "cell_methods",
                "coordinates",
            ] {
                assert!(
                    attrs.contains_key(key),
                    "{} is missing attribute {}",
                    entry.name(),
                    key
                );
            }
        }
    }

    #[test]
    fn doc_metadata() {
        let entry = Catalogue::global().lookup("DOC").unwrap();
        assert_eq!(
            entry.output_metadata(),
            &attributes([
                ("units", AttrValue::from("-")),
                ("long_name", "Dissolved Organic Carbon".into()),
                ("valid_min", (-1e20).into()),
                ("valid_max", 1e20.into()),
                ("cell_methods", "time: mean".into()),
                ("coordinates", "lon lat deptht".into()),
            ])
        );
    }

    #[test]
    fn integrals_are_horizontal() {
        for name in [
            "ZooRespI",
            "NPPOI",
            "OXIDATIONBYDOXI",
            "bac_oxygenconsumptionI",
            "CHLI",
        ] {
            let entry = Catalogue::global().lookup(name).unwrap();
            assert_eq!(
                entry.output_metadata().get("coordinates"),
                Some(&AttrValue::from("lon lat")),
                "{}",
                name
            );
        }
    }

    #[test]
    fn lookup_unknown() {
        let err = Catalogue::global().lookup("__not_a_real_name__").unwrap_err();
        assert_eq!(
            err,
            DiagError::UnknownDiagnostic {
                name: "__not_a_real_name__".to_string()
            }
        );
    }

    #[test]
    fn void_has_no_requirements() {
        let entry = Catalogue::global().lookup("VOID").unwrap();
        assert!(entry.requirements().is_empty());
        let value = entry.evaluate(&Dataset::new()).unwrap();
        assert!(value.dims().is_empty());
        assert!(value.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn dependency_graph_ignores_raw_fields() {
        let graph = Catalogue::global().dependency_graph();
        assert_eq!(graph.node_count(), Catalogue::global().len());

        let edges: Vec<(String, String)> = graph
            .raw_edges()
            .iter()
            .map(|e| (graph[e.source()].clone(), graph[e.target()].clone()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("ZooResp".to_string(), "ZooRespI".to_string()),
                ("NPPO".to_string(), "NPPOI".to_string()),
            ]
        );
    }

    #[test]
    fn cyclic_catalogue_is_invalid() {
        let catalogue = Catalogue::new()
            .with_entry(CatalogueEntry::new("A", "", double).requires(&["B"]))
            .with_entry(CatalogueEntry::new("B", "", double).requires(&["A"]));
        assert!(matches!(
            catalogue.validate(),
            Err(DiagError::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn self_requirement_is_invalid() {
        let catalogue =
            Catalogue::new().with_entry(CatalogueEntry::new("A", "", double).requires(&["A"]));
        assert!(catalogue.validate().is_err());
    }

    #[test]
    fn dot_output() {
        let catalogue = Catalogue::new()
            .with_entry(CatalogueEntry::new("B", "", double).requires(&["x"]))
            .with_entry(CatalogueEntry::new("A", "", double).requires(&["B"]));

        let exp = r#"digraph {
    0 [ label = "B"]
    1 [ label = "A"]
    0 -> 1 [ ]
}
"#;
        assert_eq!(catalogue.as_dot(), exp);
    }
}
