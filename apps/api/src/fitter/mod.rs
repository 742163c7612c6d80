// Template fitter: predicts rendered height and compresses the résumé until
// it fits one physical page, reporting what was lost along the way.

pub mod catalog;
pub mod fit;
pub mod height;
pub mod loss_report;
