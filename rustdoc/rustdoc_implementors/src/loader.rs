use crate::controller::PageController;
use crate::literal::{self, ParseLiteralError};
use crate::types::ImplementorBatch;

/// The data loader of a trait page: it contributes exactly one batch of
/// implementors to the page's [`PageController`].
#[derive(Debug, Clone)]
pub struct DataLoader {
    batch: ImplementorBatch,
}

impl DataLoader {
    pub fn new(batch: ImplementorBatch) -> Self {
        Self { batch }
    }

    /// Decode a data loader from the `implementors/**/trait.*.js` file
    /// generated by `rustdoc`.
    pub fn from_literal(source: &str) -> Result<Self, ParseLiteralError> {
        literal::parse(source).map(Self::new)
    }

    pub fn batch(&self) -> &ImplementorBatch {
        &self.batch
    }

    pub fn into_batch(self) -> ImplementorBatch {
        self.batch
    }

    /// Hand the batch over to `controller`.
    ///
    /// If the controller is ready, the batch is registered right away.
    /// Otherwise it is parked until the controller initializes.
    /// The contents of the batch are not validated.
    pub fn publish(self, controller: &mut PageController) {
        match controller.registration() {
            Some(mut registration) => registration.register_implementors(self.batch),
            None => controller.park(self.batch),
        }
    }
}

impl From<ImplementorBatch> for DataLoader {
    fn from(batch: ImplementorBatch) -> Self {
        Self::new(batch)
    }
}
