//! Tests for architecture parsing and building
//!
//! - Loading the bundled architecture file
//! - Building networks from configs
//! - Rejecting degenerate shapes and unknown activations

use std::io::Write;

use mlp_trainer::architecture::{load_architecture, ArchitectureConfig};
use mlp_trainer::utils::{Activation, SimpleRng};
use mlp_trainer::NetworkError;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

mod valid_architecture_tests {
    use super::*;

    #[test]
    fn test_load_bundled_architecture() {
        let arch = load_architecture("config/mnist.json").expect("Failed to load architecture");
        assert_eq!(arch, ArchitectureConfig::default());
    }

    #[test]
    fn test_build_from_json() {
        let file = write_temp_config(
            r#"{
  "layer_sizes": [6, 4, 3],
  "intermediate_activation": "relu",
  "output_activation": "tanh"
}"#,
        );
        let arch = load_architecture(file.path()).unwrap();
        let nn = arch.build_network(&mut SimpleRng::new(2)).unwrap();

        assert_eq!(nn.layer_count(), 2);
        assert_eq!(nn.input_size(), 6);
        assert_eq!(nn.output_size(), 3);
        assert_eq!(nn.layer(0).activation(), Activation::Relu);
        assert_eq!(nn.layer(1).activation(), Activation::Tanh);
        assert!(arch.matches(&nn));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_temp_config(r#"{ "layer_sizes": [2, 2] }"#);
        let arch = load_architecture(file.path()).unwrap();
        assert_eq!(arch.intermediate_activation, Activation::Sigmoid);
        assert_eq!(arch.output_activation, Activation::Softmax);
    }

    #[test]
    fn test_single_layer_uses_output_activation() {
        let arch = ArchitectureConfig {
            layer_sizes: vec![3, 2],
            intermediate_activation: Activation::Relu,
            output_activation: Activation::Sigmoid,
        };
        let nn = arch.build_network(&mut SimpleRng::new(1)).unwrap();
        assert_eq!(nn.layer(0).activation(), Activation::Sigmoid);
    }
}

mod invalid_architecture_tests {
    use super::*;

    #[test]
    fn test_too_few_sizes() {
        let file = write_temp_config(r#"{ "layer_sizes": [784] }"#);
        assert!(matches!(
            load_architecture(file.path()),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_width() {
        let file = write_temp_config(r#"{ "layer_sizes": [4, 0, 2] }"#);
        let err = load_architecture(file.path()).unwrap_err();
        assert!(err.to_string().contains("layer_sizes[1]"));
    }

    #[test]
    fn test_unknown_activation() {
        let file = write_temp_config(r#"{ "output_activation": "gelu" }"#);
        assert!(matches!(load_architecture(file.path()), Err(NetworkError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_architecture("config/nonexistent.json").is_err());
    }
}
