pub mod assemble;
pub mod bill_list;
pub mod config;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod remote;
pub mod resolve;
pub mod tesseract;
pub mod types;
pub mod upload;

pub use assemble::{Assembler, Rejection, Severity, Stage};
pub use bill_list::BillListParser;
pub use config::{ConfigError, ProviderConfig, RecognitionConfig};
pub use pipeline::{RecognitionError, RecognitionPipeline, RecognitionRequest};
pub use preprocess::{prepare_for_ocr, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, OcrOutput, Recognizer};
pub use remote::{HttpStructuredRecognizer, HttpTextRecognizer};
pub use resolve::LookupTables;
pub use tesseract::TesseractRecognizer;
pub use types::{RawRecognizedItem, RecognitionCandidate, RecognitionResponse};
pub use upload::{ImageUpload, UploadError};
