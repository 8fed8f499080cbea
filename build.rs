use std::path::Path;

const MANDATORY: [&str; 6] = [
    "database_id",
    "species",
    "cell_line",
    "tumor_annotation",
    "sequencing_method",
    "tissue_source",
];
const OPTIONAL: [&str; 4] = ["publication", "sample_size", "country", "age"];

fn main() {
    let config_path = Path::new("vocabularies/default.json");
    validate_config_file(config_path);
    set_build_dependencies();
}

fn validate_config_file(config_path: &Path) {
    // Ensure the default vocabulary exists at build time
    assert!(
        config_path.exists(),
        "\n\nVOCABULARY BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the vocabulary file before building.\n",
        config_path.display()
    );

    let contents = std::fs::read_to_string(config_path).unwrap_or_else(|e| {
        panic!(
            "\n\nVOCABULARY BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            config_path.display()
        );
    });

    let config: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nVOCABULARY BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            config_path.display()
        );
    });

    validate_config_structure(&config);
}

fn validate_config_structure(config: &serde_json::Value) {
    assert!(
        config.is_object(),
        "\n\nVOCABULARY BUILD ERROR: Root must be a JSON object\n"
    );

    for field in [
        "version",
        "name",
        "mandatory",
        "optional",
        "weights",
        "grading",
        "confidence",
        "profiling",
    ] {
        assert!(
            config.get(field).is_some(),
            "\n\nVOCABULARY BUILD ERROR: Missing top-level '{field}' field\n"
        );
    }

    let terms = validate_vocabularies(config);
    validate_weights(config);
    validate_grading(config);

    println!(
        "cargo:warning=Validated vocabulary {} v{}: {terms} terms",
        config["name"].as_str().unwrap_or("<unnamed>"),
        config["version"].as_str().unwrap_or("?"),
    );
}

/// Every keyword table must be a non-empty array of strings; returns the total term count
fn validate_vocabularies(config: &serde_json::Value) -> usize {
    let tables = [
        "/mandatory/species/keywords",
        "/mandatory/species/taxon_ids",
        "/mandatory/cell_line/blacklist",
        "/mandatory/database_id/geo_prefixes",
        "/mandatory/database_id/sra_prefixes",
        "/mandatory/tumor_annotation/tumor_keywords",
        "/mandatory/tumor_annotation/normal_keywords",
        "/mandatory/sequencing_method/keywords",
        "/mandatory/tissue_source/keywords",
        "/optional/publication/keywords",
        "/optional/sample_size/patterns",
        "/optional/age/patterns",
    ];

    let mut total = 0;
    for pointer in tables {
        let array = config
            .pointer(pointer)
            .and_then(serde_json::Value::as_array)
            .unwrap_or_else(|| {
                panic!("\n\nVOCABULARY BUILD ERROR: '{pointer}' must be an array\n");
            });
        assert!(
            !array.is_empty(),
            "\n\nVOCABULARY BUILD ERROR: '{pointer}' is empty\n"
        );
        for (i, term) in array.iter().enumerate() {
            let term = term.as_str().unwrap_or_else(|| {
                panic!("\n\nVOCABULARY BUILD ERROR: '{pointer}' entry {i} is not a string\n");
            });
            assert!(
                !term.trim().is_empty(),
                "\n\nVOCABULARY BUILD ERROR: '{pointer}' entry {i} is blank\n"
            );
            if let Some(marker) = term.find('*').filter(|_| !pointer.ends_with("/patterns")) {
                assert!(
                    marker == term.len() - 1 && term[..marker].trim().chars().count() >= 3,
                    "\n\nVOCABULARY BUILD ERROR: '{pointer}' entry {i} ('{term}') has a misplaced '*'\n\
                     Hint: '*' marks a prefix stem and must be the last character, after at least 3 characters.\n"
                );
            }
        }
        total += array.len();
    }

    let countries = config
        .pointer("/optional/country/countries")
        .and_then(serde_json::Value::as_object)
        .unwrap_or_else(|| {
            panic!("\n\nVOCABULARY BUILD ERROR: '/optional/country/countries' must be an object\n");
        });
    assert!(
        !countries.is_empty(),
        "\n\nVOCABULARY BUILD ERROR: country table is empty\n"
    );
    total + countries.len()
}

fn validate_weights(config: &serde_json::Value) {
    let weight = |name: &str| -> f64 {
        let value = config
            .pointer(&format!("/weights/{name}"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_else(|| {
                panic!("\n\nVOCABULARY BUILD ERROR: Missing numeric weight for '{name}'\n");
            });
        assert!(
            value.is_finite() && value > 0.0,
            "\n\nVOCABULARY BUILD ERROR: Weight for '{name}' must be positive, got {value}\n"
        );
        value
    };

    let min_mandatory = MANDATORY.into_iter().map(&weight).fold(f64::INFINITY, f64::min);
    let max_optional = OPTIONAL.into_iter().map(&weight).fold(0.0, f64::max);
    assert!(
        min_mandatory > max_optional,
        "\n\nVOCABULARY BUILD ERROR: Every mandatory weight must exceed every optional weight\n\
         Smallest mandatory: {min_mandatory}, largest optional: {max_optional}\n"
    );
}

fn validate_grading(config: &serde_json::Value) {
    let bounds: Vec<f64> = ["e", "d", "c", "b", "a"]
        .iter()
        .map(|g| {
            config
                .pointer(&format!("/grading/{g}"))
                .and_then(serde_json::Value::as_f64)
                .unwrap_or_else(|| {
                    panic!("\n\nVOCABULARY BUILD ERROR: Missing grade boundary '{g}'\n");
                })
        })
        .collect();
    assert!(
        bounds.windows(2).all(|w| w[0] < w[1]),
        "\n\nVOCABULARY BUILD ERROR: Grade boundaries must ascend E < D < C < B < A\n\
         Got: {bounds:?}\n"
    );
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the vocabulary changes
    println!("cargo:rerun-if-changed=vocabularies/default.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
