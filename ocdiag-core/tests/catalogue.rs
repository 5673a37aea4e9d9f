//! End-to-end resolution of the standard catalogue on a synthetic NEMO-like dataset.
//!
//! The dataset has dimensions `(time_counter, deptht, y, x)` = `(1, 3, 2, 2)` with
//! levels centred at 1, 4 and 10 m and thicknesses of 2, 4 and 8 m.

use approx::assert_relative_eq;
use ndarray::{array, ArrayD, IxDyn};
use ocdiag_core::field::attributes;
use ocdiag_core::{add, AttrValue, Catalogue, Dataset, DiagError, Field};

const DIMS: [&str; 4] = ["time_counter", "deptht", "y", "x"];

fn level_field(per_level: [f64; 3]) -> Field {
    let values = ArrayD::from_shape_fn(IxDyn(&[1, 3, 2, 2]), |idx| per_level[idx[1]]);
    Field::new(DIMS, values)
}

fn nemo_dataset() -> Dataset {
    let mut ds = Dataset::new();
    ds.insert_coord(
        "time_counter",
        Field::new(["time_counter"], array![43200.0].into_dyn()),
    );
    ds.insert_coord(
        "deptht",
        Field::new(["deptht"], array![1.0, 4.0, 10.0].into_dyn()).with_attrs(attributes([
            ("units", AttrValue::from("m")),
            ("bounds", "deptht_bounds".into()),
        ])),
    );
    ds.insert(
        "deptht_bounds",
        Field::new(
            ["deptht", "axis_nbounds"],
            array![[0.0, 2.0], [2.0, 6.0], [6.0, 14.0]].into_dyn(),
        ),
    );

    ds.insert("NPP", level_field([1.0, 2.0, 3.0]));
    ds.insert("PhytoNitrateReduction", level_field([0.5, 0.5, 0.5]));
    ds.insert("TotalRespiration_Zoo", level_field([1.0, 1.0, 1.0]));
    ds.insert("TotalRespiration_Gel", level_field([2.0, 2.0, 2.0]));
    ds.insert("OXIDATIONBYDOX", level_field([0.0, 1.0, 2.0]));
    ds.insert("bac_oxygenconsumption", level_field([1.0, 1.0, 1.0]));
    ds.insert("DCL", level_field([3.0, 2.0, 1.0]));
    ds.insert("DCS", level_field([1.0, 1.0, 1.0]));

    let mut chl = level_field([1.0, 2.0, 3.0]);
    let mut values = chl.values().clone();
    values[[0, 2, 1, 1]] = f64::NAN;
    chl = Field::new(DIMS, values);
    ds.insert("CHL", chl);
    ds
}

fn value_at(ds: &Dataset, name: &str, y: usize, x: usize) -> f64 {
    ds.field(name).unwrap().values()[[0, y, x]]
}

mod standard_diagnostics {
    use super::*;

    const DEFAULT_DIAGNOSTICS: [&str; 7] = [
        "NPPO",
        "ZooResp",
        "DOC",
        "ZooRespI",
        "NPPOI",
        "OXIDATIONBYDOXI",
        "bac_oxygenconsumptionI",
    ];

    #[test]
    fn default_list_resolves() {
        let mut ds = nemo_dataset();
        add(&mut ds, &DEFAULT_DIAGNOSTICS, false).unwrap();

        for name in DEFAULT_DIAGNOSTICS {
            assert!(ds.contains(name), "{} was not added", name);
        }

        // 1.5 * 2 + 2.5 * 4 + 3.5 * 8
        assert_relative_eq!(value_at(&ds, "NPPOI", 0, 0), 41.0);
        // 3 * 14
        assert_relative_eq!(value_at(&ds, "ZooRespI", 1, 1), 42.0);
        // 0 * 2 + 1 * 4 + 2 * 8
        assert_relative_eq!(value_at(&ds, "OXIDATIONBYDOXI", 0, 1), 20.0);
        assert_relative_eq!(value_at(&ds, "bac_oxygenconsumptionI", 1, 0), 14.0);

        let doc = ds.field("DOC").unwrap();
        assert_eq!(doc.dims(), &DIMS);
        assert_relative_eq!(doc.values()[[0, 0, 0, 0]], 4.0);
        assert_relative_eq!(doc.values()[[0, 2, 1, 1]], 2.0);
    }

    #[test]
    fn integrals_drop_the_vertical_dimension() {
        let mut ds = nemo_dataset();
        add(&mut ds, &["ZooRespI"], false).unwrap();

        let field = ds.field("ZooRespI").unwrap();
        assert_eq!(field.dims(), &["time_counter", "y", "x"]);
        assert_eq!(field.shape(), &[1, 2, 2]);
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut ds = nemo_dataset();
        add(&mut ds, &["CHLI"], false).unwrap();

        assert_relative_eq!(value_at(&ds, "CHLI", 0, 0), 34.0);
        assert_relative_eq!(value_at(&ds, "CHLI", 1, 1), 10.0);
    }

    #[test]
    fn intermediate_diagnostics_are_added() {
        let mut ds = nemo_dataset();
        add(&mut ds, &["NPPOI", "ZooRespI"], true).unwrap();

        assert!(ds.contains("NPPO"));
        assert!(ds.contains("ZooResp"));
    }

    #[test]
    fn metadata_matches_catalogue() {
        let mut ds = nemo_dataset();
        add(&mut ds, &["NPPOI"], false).unwrap();

        for name in ["NPPO", "NPPOI"] {
            let expected = Catalogue::global().lookup(name).unwrap().output_metadata();
            assert_eq!(ds.field(name).unwrap().attrs(), expected);
        }
        assert_eq!(
            ds.field("NPPOI").unwrap().attr("long_name"),
            Some(&AttrValue::from("Net Phyto Oxygen - Vertical integral"))
        );
    }

    #[test]
    fn raw_fields_are_untouched() {
        let mut ds = nemo_dataset();
        let before = ds.clone();
        add(&mut ds, &["NPPOI", "DOC", "CHLI"], false).unwrap();

        for name in before.names() {
            let (after, original) = (ds.field(name).unwrap(), before.field(name).unwrap());
            assert!(after.same_values(original), "{} was modified", name);
            assert_eq!(after.attrs(), original.attrs());
        }
    }

    #[test]
    fn subset_keeps_vertical_coordinates() {
        let mut ds = nemo_dataset();
        add(&mut ds, &["NPPO", "NPPOI"], false).unwrap();

        let out = ds.subset(&["NPPO", "NPPOI"]).unwrap();
        let names: Vec<&str> = out.names().collect();
        assert_eq!(
            names,
            vec!["time_counter", "deptht", "deptht_bounds", "NPPO", "NPPOI"]
        );
    }
}

mod failures {
    use super::*;

    #[test]
    fn missing_bounds_keeps_partial_results() {
        let mut ds = nemo_dataset();
        ds.remove("deptht_bounds");

        let err = add(&mut ds, &["NPPOI"], false).unwrap_err();

        match err {
            DiagError::Evaluation { name, source } => {
                assert_eq!(name, "NPPOI");
                assert!(matches!(
                    *source,
                    DiagError::MissingGridMetadata { ref coordinate, .. } if coordinate == "deptht"
                ));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(ds.contains("NPPO"));
        assert!(!ds.contains("NPPOI"));
    }

    #[test]
    fn missing_raw_field() {
        let mut ds = nemo_dataset();
        ds.remove("DCS");

        let err = add(&mut ds, &["DOC"], false).unwrap_err();
        assert_eq!(
            err,
            DiagError::UnresolvableRequirement {
                requirement: "DCS".to_string(),
                required_by: "DOC".to_string(),
            }
        );
    }

    #[test]
    fn incompatible_dimensions() {
        let mut ds = nemo_dataset();
        ds.insert("DCS", Field::new(["x"], array![1.0, 1.0].into_dyn()));

        match add(&mut ds, &["DOC"], false) {
            Err(DiagError::Evaluation { name, source }) => {
                assert_eq!(name, "DOC");
                assert!(matches!(*source, DiagError::DimensionMismatch { .. }));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
