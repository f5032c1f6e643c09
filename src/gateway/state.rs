use std::path::PathBuf;

use crate::inspection::InspectionService;
use crate::store::Database;

#[derive(Clone)]
pub struct HandlerState {
    pub service: InspectionService,

    pub storage_path: PathBuf,
}

impl HandlerState {
    pub fn new(service: InspectionService, storage_path: PathBuf) -> Self {
        Self {
            service,
            storage_path,
        }
    }

    pub fn database(&self) -> &Database {
        self.service.database()
    }
}
