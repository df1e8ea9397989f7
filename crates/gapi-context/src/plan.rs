//! Financial plan documents backed by spreadsheets.

use crate::sheets::{Spreadsheet, SpreadsheetTemplate, SpreadsheetsApi};
use crate::SheetsResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Title given to newly created plans.
pub const PLAN_TITLE: &str = "Financial Plan";

/// Sheets every plan starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanSheet {
    Overview,
    Assumptions,
}

impl PlanSheet {
    pub const ALL: [PlanSheet; 2] = [PlanSheet::Overview, PlanSheet::Assumptions];

    pub fn title(&self) -> &'static str {
        match self {
            PlanSheet::Overview => "Overview",
            PlanSheet::Assumptions => "Assumptions",
        }
    }
}

/// A plan is a spreadsheet created from the plan template.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    spreadsheet: Spreadsheet,
}

impl Plan {
    pub fn template() -> SpreadsheetTemplate {
        SpreadsheetTemplate::with_sheets(PLAN_TITLE, PlanSheet::ALL.iter().map(PlanSheet::title), 1, 1)
    }

    pub async fn create(api: &SpreadsheetsApi) -> SheetsResult<Self> {
        let spreadsheet = api.create(&Self::template()).await?;
        Ok(Self { spreadsheet })
    }

    pub async fn get(api: &SpreadsheetsApi, id: &str) -> SheetsResult<Self> {
        let spreadsheet = api.get(id).await?;
        Ok(Self { spreadsheet })
    }

    pub fn id(&self) -> &str {
        self.spreadsheet.id()
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.spreadsheet
    }
}

/// Reuses plans that are still alive somewhere in the application.
///
/// Entries are weak: a plan is served from the cache only while another
/// holder keeps it alive.
#[derive(Default)]
pub struct PlanCache {
    recent: Mutex<HashMap<String, Weak<Plan>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new plan and remember it.
    pub async fn create(&self, api: &SpreadsheetsApi) -> SheetsResult<Arc<Plan>> {
        let plan = Arc::new(Plan::create(api).await?);
        self.remember(&plan);
        Ok(plan)
    }

    /// Return the live plan for `id`, or fetch it.
    pub async fn get(&self, api: &SpreadsheetsApi, id: &str) -> SheetsResult<Arc<Plan>> {
        if let Some(plan) = self.lookup(id) {
            debug!(plan_id = %id, "Serving memoized plan");
            return Ok(plan);
        }

        let plan = Arc::new(Plan::get(api, id).await?);
        self.remember(&plan);
        Ok(plan)
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Plan>> {
        self.recent.lock().get(id).and_then(Weak::upgrade)
    }

    pub fn len(&self) -> usize {
        self.recent
            .lock()
            .values()
            .filter(|plan| plan.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remember(&self, plan: &Arc<Plan>) {
        let mut recent = self.recent.lock();
        recent.retain(|_, cached| cached.strong_count() > 0);
        recent.insert(plan.id().to_string(), Arc::downgrade(plan));
    }
}
