pub mod dashboard;
pub mod model;
pub mod recognizer;
pub mod tracker;

pub use dashboard::{goal_progress, macro_breakdown, DashboardSummary, MacroBreakdown, NutrientTargets};
pub use model::{FoodDetection, Nutrition, ScanResult};
pub use recognizer::{HttpRecognizer, ImageUpload, Recognizer};
pub use tracker::{RecognitionSnapshot, RecognitionStatus, RecognitionTracker};
