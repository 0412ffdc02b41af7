//! Wire round trips preserve plan structure

use proptest::prelude::*;
use tempfile::TempDir;
use wayang_planner::config::{InputConfig, OutputConfig};
use wayang_planner::{Operation, OperationCategory, OperationGraph, PlanMapper};

/// Column names, including ones a loose `FROM` match would trip over.
fn column() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,7}",
        Just("from".to_string()),
        Just("valid_from".to_string()),
        "[a-z]{1,5}_from",
    ]
}

/// Logical file names, optionally spaced or dotted (never ending in `.txt`).
fn file_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}( [a-z]{1,4})?(\\.[0-9]{2,4})?"
}

/// Any supported operator, with the payload its kind needs.
fn operation(id: u32) -> impl Strategy<Value = Operation> {
    let names = prop_oneof![
        Just("jdbcRemoteInput"),
        Just("textFileInput"),
        Just("map"),
        Just("flatMap"),
        Just("filter"),
        Just("reduce"),
        Just("reduceBy"),
        Just("groupBy"),
        Just("sort"),
        Just("join"),
        Just("textFileOutput"),
    ];
    (
        names,
        proptest::collection::vec(1u32..40, 0..3),
        proptest::collection::vec(1u32..40, 0..3),
        "[a-z]{1,8}",
        "[A-Za-z][A-Za-z0-9_]{0,9}",
        proptest::collection::vec(column(), 0..4),
        file_name(),
    )
        .prop_map(move |(name, input, output, body, table, columns, file)| {
            let cat = match name {
                "jdbcRemoteInput" | "textFileInput" => OperationCategory::Input,
                "textFileOutput" => OperationCategory::Output,
                "join" => OperationCategory::Binary,
                _ => OperationCategory::Unary,
            };
            let (input, output) = match name {
                "textFileInput" => (vec![], output),
                "textFileOutput" => (input, vec![]),
                _ => (input, output),
            };
            let mut op = Operation::new(id, cat, name, input, output);
            match name {
                "jdbcRemoteInput" => {
                    op.table = Some(table);
                    op.column_names = columns;
                }
                "textFileInput" => op.input_file_name = Some(file),
                "textFileOutput" => {}
                "join" => {
                    op.this_key_udf = Some(format!("l => l.{}", body));
                    op.that_key_udf = Some(format!("r => r.{}", body));
                }
                "groupBy" | "sort" => op.key_udf = Some(format!("x => x.{}", body)),
                "reduceBy" => {
                    op.key_udf = Some(format!("x => x.{}", body));
                    op.udf = Some("(a, b) => a".to_string());
                }
                "reduce" => op.udf = Some(format!("(a, b) => a.{}", body)),
                _ => op.udf = Some(format!("x => x.{}", body)),
            }
            op
        })
}

fn graph() -> impl Strategy<Value = OperationGraph> {
    (1usize..12).prop_flat_map(|n| {
        (1..=n as u32)
            .map(operation)
            .collect::<Vec<_>>()
            .prop_map(OperationGraph::new)
    })
}

proptest! {
    #[test]
    fn from_wire_inverts_to_wire(graph in graph()) {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let mapper = PlanMapper::new(
            InputConfig {
                jdbc_uri: Some("jdbc:postgresql://localhost:5432/db".to_string()),
                jdbc_username: Some("user".to_string()),
                jdbc_password: Some("secret".to_string()),
                input_folder: Some(input_dir.path().to_path_buf()),
            },
            OutputConfig {
                output_folder: Some(output_dir.path().to_path_buf()),
            },
        );

        let (wire, report) = mapper.to_wire_with_report(&graph);
        prop_assert!(report.is_complete());

        let back = mapper.from_wire(&wire).unwrap();
        prop_assert_eq!(back.len(), graph.len());
        for (original, restored) in graph.operations.iter().zip(&back.operations) {
            prop_assert_eq!(restored.id, original.id);
            prop_assert_eq!(restored.cat, original.cat);
            prop_assert_eq!(&restored.operator_name, &original.operator_name);
            prop_assert_eq!(&restored.input_ids, &original.input_ids);
            prop_assert_eq!(&restored.output_ids, &original.output_ids);
            prop_assert_eq!(&restored.udf, &original.udf);
            prop_assert_eq!(&restored.key_udf, &original.key_udf);
            prop_assert_eq!(&restored.this_key_udf, &original.this_key_udf);
            prop_assert_eq!(&restored.that_key_udf, &original.that_key_udf);
            prop_assert_eq!(&restored.table, &original.table);
            prop_assert_eq!(&restored.column_names, &original.column_names);
            prop_assert_eq!(&restored.input_file_name, &original.input_file_name);
        }
    }
}
