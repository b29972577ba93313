pub mod assessment;
pub mod extracted;

pub use assessment::{AssessmentRecord, Criticality, Gap, ScoreResult};
pub use extracted::{
    Category, ContactInfo, ExtractedData, FinancialDetails, LineItem, Party, PaymentStructure,
    RevenueClassification, ServiceLevelTerms,
};
