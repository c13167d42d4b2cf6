use darknet::{BBox, Image, Network};
use image::DynamicImage;
use log::{debug, info};
use std::{fs, path::PathBuf};

use crate::config::constants;
use crate::error::ClassifierError;

/// Perception boundary for the security service.
///
/// Implementations decide whether a camera frame shows a cat. The service
/// treats the answer as a black box and only passes the confidence threshold
/// through.
pub trait ImageClassifier {
    /// Return whether `image` contains a cat with at least
    /// `confidence_threshold` percent confidence.
    fn image_contains_cat(
        &mut self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<bool, ClassifierError>;
}

/// Cat detection service using YOLO/Darknet neural networks.
///
/// Runs a general object detection model on camera frames and looks for
/// detections carrying the cat label. Any COCO-style model whose labels
/// include `cat` works.
pub struct CatDetector {
    network: Network,
    labels: Vec<String>,
    objectness_threshold: f32,
    last_detections: Vec<Detection>,
}

impl CatDetector {
    /// Create a new CatDetector with the specified model and configuration.
    ///
    /// # Arguments
    ///
    /// * `model_cfg` - Path to the YOLO/Darknet configuration file
    /// * `weights_path` - Path to the trained model weights file
    /// * `labels_path` - Path to the file containing class labels, one per line
    /// * `objectness_threshold` - Minimum objectness score for detections
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Labels file cannot be read
    /// - Model files cannot be loaded
    pub fn new(
        model_cfg: PathBuf,
        weights_path: PathBuf,
        labels_path: PathBuf,
        objectness_threshold: f32,
    ) -> Result<Self, ClassifierError> {
        let labels = fs::read_to_string(&labels_path)
            .map_err(|e| ClassifierError::LabelsLoadFailed {
                path: labels_path.display().to_string(),
                reason: e.to_string(),
            })?
            .lines()
            .map(|line| line.trim().to_owned())
            .collect::<Vec<_>>();

        if !labels.iter().any(|label| is_cat_label(label)) {
            return Err(ClassifierError::LabelsLoadFailed {
                path: labels_path.display().to_string(),
                reason: format!("no '{}' label in model labels", constants::CAT_LABEL),
            });
        }

        let network = Network::load(&model_cfg, Some(&weights_path), false).map_err(|e| {
            ClassifierError::ModelLoadFailed {
                path: model_cfg.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(
            "Loaded detection model {} with {} labels",
            model_cfg.display(),
            labels.len()
        );

        Ok(Self {
            network,
            labels,
            objectness_threshold,
            last_detections: Vec::new(),
        })
    }

    /// Detect objects in the provided frame.
    ///
    /// Keeps detections whose objectness exceeds the objectness threshold and
    /// whose best class probability reaches `confidence_threshold` percent.
    pub fn detect(&mut self, image: &DynamicImage, confidence_threshold: f32) -> Vec<Detection> {
        let darknet_image = Image::from(image.clone());

        // Run object detection with NMS parameters
        let detections = self.network.predict(
            &darknet_image,
            constants::DETECTION_THRESHOLD,
            constants::HIERARCHY_THRESHOLD,
            constants::NMS_THRESHOLD,
            true,
        );

        let class_prob_threshold = (confidence_threshold / 100.0).clamp(0.0, 1.0);
        let mut results = Vec::new();

        for det in detections
            .iter()
            .filter(|det| det.objectness() > self.objectness_threshold)
        {
            if let Some((class_index, prob)) = det.best_class(Some(class_prob_threshold)) {
                let label = self
                    .labels
                    .get(class_index)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());

                results.push(Detection {
                    label,
                    confidence: prob,
                    bbox: *det.bbox(),
                });
            }
        }

        results
    }

    /// Detections from the most recent classification, cats and otherwise.
    pub fn last_detections(&self) -> &[Detection] {
        &self.last_detections
    }

    /// Detections from the most recent classification that are cats.
    pub fn last_cat_detections(&self) -> Vec<Detection> {
        self.last_detections
            .iter()
            .filter(|d| d.is_cat())
            .cloned()
            .collect()
    }

    pub fn get_labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get_objectness_threshold(&self) -> f32 {
        self.objectness_threshold
    }

    /// Update the objectness threshold.
    ///
    /// # Arguments
    ///
    /// * `threshold` - New objectness threshold (0.0 to 1.0)
    pub fn set_objectness_threshold(&mut self, threshold: f32) {
        self.objectness_threshold = threshold.clamp(0.0, 1.0);
    }
}

impl ImageClassifier for CatDetector {
    fn image_contains_cat(
        &mut self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<bool, ClassifierError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::InferenceFailed {
                reason: "frame has no pixels".to_string(),
            });
        }

        self.last_detections = self.detect(image, confidence_threshold);
        let contains_cat = self
            .last_detections
            .iter()
            .any(|d| d.is_cat() && d.meets_threshold(confidence_threshold));

        debug!(
            "Classified frame: {} detection(s), cat: {}",
            self.last_detections.len(),
            contains_cat
        );

        Ok(contains_cat)
    }
}

fn is_cat_label(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case(constants::CAT_LABEL)
}

/// A single object detection result.
#[derive(Debug, Clone)]
pub struct Detection {
    /// The detected class label (e.g., "cat", "dog").
    pub label: String,

    /// Confidence score from 0.0 to 1.0.
    pub confidence: f32,

    /// Bounding box centre and size, relative to the frame dimensions.
    pub bbox: BBox,
}

impl Detection {
    pub fn center_x(&self) -> f32 {
        self.bbox.x
    }

    pub fn center_y(&self) -> f32 {
        self.bbox.y
    }

    pub fn width(&self) -> f32 {
        self.bbox.w
    }

    pub fn height(&self) -> f32 {
        self.bbox.h
    }

    /// Get the confidence as a percentage.
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Check whether this detection reaches a confidence threshold given in percent.
    pub fn meets_threshold(&self, threshold_percent: f32) -> bool {
        self.confidence_percent() >= threshold_percent
    }

    pub fn is_cat(&self) -> bool {
        is_cat_label(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: BBox {
                x: 0.5,
                y: 0.5,
                w: 0.2,
                h: 0.3,
            },
        }
    }

    #[test]
    fn test_cat_label_is_case_insensitive() {
        assert!(detection("cat", 0.9).is_cat());
        assert!(detection("Cat", 0.9).is_cat());
        assert!(!detection("dog", 0.9).is_cat());
        assert!(!detection("catapult", 0.9).is_cat());
    }

    #[test]
    fn test_threshold_is_percent() {
        let det = detection("cat", 0.5);
        assert!(det.meets_threshold(50.0));
        assert!(!det.meets_threshold(50.1));
        assert_eq!(det.confidence_percent(), 50.0);
    }

    #[test]
    fn test_bbox_accessors() {
        let det = detection("cat", 0.7);
        assert_eq!(det.center_x(), 0.5);
        assert_eq!(det.center_y(), 0.5);
        assert_eq!(det.width(), 0.2);
        assert_eq!(det.height(), 0.3);
    }
}
