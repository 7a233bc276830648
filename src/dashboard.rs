use crate::aggregate::{
    distinct_crops, distinct_seasons, totals_by_category, CategoryTotals, DashboardSummary,
};
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::export::ExportMetadata;
use crate::filter::{FilterCriteria, FilteredView, PropertyIndex};
use crate::report::{build_from_view, build_report, ReportRequest, ReportSeries, ReportType};
use crate::schema::{DashboardData, FinancialTransaction, ProductionRecord, Property};
use crate::store::{DataSource, EntityStore, ReloadOutcome, ReloadTicket};
use chrono::{Local, NaiveDate};
use log::debug;
use std::collections::BTreeMap;

/// Everything a renderer needs, computed in one pass from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub revision: u64,
    pub reference_date: NaiveDate,
    pub criteria: FilterCriteria,
    pub report_request: ReportRequest,
    pub properties: Vec<Property>,
    pub productions: Vec<ProductionRecord>,
    pub transactions: Vec<FinancialTransaction>,
    pub summary: DashboardSummary,
    pub category_totals: BTreeMap<String, CategoryTotals>,
    pub report: ReportSeries,
    pub crop_options: Vec<String>,
    pub season_options: Vec<String>,
}

impl DashboardView {
    fn compute(
        revision: u64,
        data: &DashboardData,
        criteria: &FilterCriteria,
        report_request: &ReportRequest,
        reference_date: NaiveDate,
    ) -> Self {
        let filtered = FilteredView::apply(data, criteria, reference_date);
        let report_view = FilteredView::apply(data, &report_request.criteria, reference_date);

        Self {
            revision,
            reference_date,
            criteria: criteria.clone(),
            report_request: report_request.clone(),
            summary: DashboardSummary::from_view(&filtered),
            category_totals: totals_by_category(filtered.transactions.iter().copied()),
            report: build_from_view(report_request.report_type, &report_view),
            crop_options: distinct_crops(&data.productions),
            season_options: distinct_seasons(&data.productions),
            properties: filtered.properties.into_iter().cloned().collect(),
            productions: filtered.productions.into_iter().cloned().collect(),
            transactions: filtered.transactions.into_iter().cloned().collect(),
        }
    }
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&DashboardView)>;

/// Session state: the entity store, the user's selections, and the derived view.
///
/// Every change (new snapshot, new criteria, new report mode) goes through
/// [`Dashboard::recompute`], which rebuilds the whole view and notifies each
/// listener once.
pub struct Dashboard {
    config: DashboardConfig,
    store: EntityStore,
    criteria: FilterCriteria,
    report_request: ReportRequest,
    fixed_reference_date: Option<NaiveDate>,
    view: DashboardView,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let criteria = FilterCriteria::default().with_window(config.default_window());
        let report_request = ReportRequest::default();
        let store = EntityStore::new();
        let today = Local::now().date_naive();
        let view = DashboardView::compute(0, store.snapshot(), &criteria, &report_request, today);

        Self {
            config,
            store,
            criteria,
            report_request,
            fixed_reference_date: None,
            view,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Pins "now" for date windows instead of using the local clock.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.fixed_reference_date = Some(date);
        self.recompute();
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn data(&self) -> &DashboardData {
        self.store.snapshot()
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn report_request(&self) -> &ReportRequest {
        &self.report_request
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.fixed_reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&DashboardView) + 'static,
    {
        self.next_subscription += 1;
        self.listeners.push((self.next_subscription, Box::new(listener)));
        self.next_subscription
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub async fn reload<S>(&mut self, source: &S) -> Result<ReloadOutcome>
    where
        S: DataSource + ?Sized,
    {
        let ticket = self.store.begin_reload();
        let response = source.load_dashboard_data().await;
        self.complete_reload(ticket, response)
    }

    /// Starts a reload whose response will arrive through [`Dashboard::complete_reload`].
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.store.begin_reload()
    }

    pub fn complete_reload(
        &mut self,
        ticket: ReloadTicket,
        response: Result<DashboardData>,
    ) -> Result<ReloadOutcome> {
        let outcome = self.store.complete_reload(ticket, response)?;
        if outcome.is_applied() {
            self.recompute();
        }
        Ok(outcome)
    }

    pub fn replace_data(&mut self, data: DashboardData) -> Result<()> {
        self.store.replace(data)?;
        self.recompute();
        Ok(())
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.recompute();
    }

    pub fn update_criteria<F>(&mut self, update: F)
    where
        F: FnOnce(&mut FilterCriteria),
    {
        update(&mut self.criteria);
        self.recompute();
    }

    pub fn set_report_request(&mut self, request: ReportRequest) {
        self.report_request = request;
        self.recompute();
    }

    /// Switches report mode, clearing criteria the new mode cannot use.
    pub fn select_report_type(&mut self, report_type: ReportType) {
        self.report_request.select_report_type(report_type);
        self.recompute();
    }

    /// Rebuilds the view from the current snapshot and selections, then notifies listeners.
    pub fn recompute(&mut self) {
        let revision = self.view.revision + 1;
        let view = DashboardView::compute(
            revision,
            self.store.snapshot(),
            &self.criteria,
            &self.report_request,
            self.reference_date(),
        );
        debug!(
            "Recomputed dashboard view #{}: {} properties, {} productions, {} transactions",
            revision,
            view.properties.len(),
            view.productions.len(),
            view.transactions.len()
        );

        self.view = view;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.view);
        }
    }

    pub fn filtered_properties(&self) -> &[Property] {
        &self.view.properties
    }

    pub fn filtered_productions(&self) -> &[ProductionRecord] {
        &self.view.productions
    }

    pub fn filtered_transactions(&self) -> &[FinancialTransaction] {
        &self.view.transactions
    }

    pub fn summary(&self) -> &DashboardSummary {
        &self.view.summary
    }

    pub fn report(&self) -> &ReportSeries {
        &self.view.report
    }

    /// Builds a report for an arbitrary request without touching the session state.
    pub fn build_report(&self, request: &ReportRequest) -> ReportSeries {
        build_report(self.store.snapshot(), request, self.reference_date())
    }

    pub fn property_name(&self, property_id: Option<&str>) -> String {
        PropertyIndex::new(&self.store.snapshot().properties)
            .name_of(property_id)
            .to_string()
    }

    pub fn export_metadata(&self) -> ExportMetadata {
        ExportMetadata::new(
            self.report_request.report_type,
            self.reference_date(),
            &self.config.export_file_prefix,
        )
    }
}
