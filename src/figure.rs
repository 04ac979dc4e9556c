use crate::core::{Color, Figure, StageSeries, StepChart, StepTrace, Style};

pub fn figure() -> FigureBuilder {
    FigureBuilder {
        fig: Figure::default(),
    }
}

pub struct FigureBuilder {
    fig: Figure,
}

impl FigureBuilder {
    pub fn background_color(mut self, c: Color) -> Self {
        self.fig.background = c;
        self
    }

    /// Set the number of columns per row (default: auto based on chart count)
    pub fn columns(mut self, cols: usize) -> Self {
        self.fig.columns = Some(cols.max(1));
        self
    }

    pub fn step_chart<F>(mut self, f: F) -> Self
    where
        F: FnOnce(StepChartBuilder) -> StepChartBuilder,
    {
        let b = f(StepChartBuilder::new());
        self.fig.charts.push(b.chart);
        self
    }

    /// Get the built Figure without running it
    pub fn build(self) -> Figure {
        self.fig
    }

    /// Open a window and display the figure, blocking until it is closed
    #[cfg(not(target_arch = "wasm32"))]
    pub fn show(self) {
        crate::runtime::run_figure(self.fig);
    }
}

pub struct StepChartBuilder {
    chart: StepChart,
}

impl StepChartBuilder {
    fn new() -> Self {
        Self {
            chart: StepChart::new(),
        }
    }

    /// Append a fully configured trace.
    pub fn trace(mut self, trace: StepTrace) -> Self {
        self.chart.traces.push(trace);
        self
    }

    /// Append a trace with the default styling: blue step line, red midpoint
    /// markers.
    pub fn series(self, series: StageSeries) -> Self {
        self.trace(StepTrace::new(series))
    }

    /// Append a trace with an explicit line style; markers keep the default.
    pub fn step(mut self, series: StageSeries, style: impl Into<Option<Style>>) -> Self {
        let mut trace = StepTrace::new(series);
        if let Some(st) = style.into() {
            trace.line_style = st;
        }
        self.chart.traces.push(trace);
        self
    }

    /// Set the chart title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.chart.meta.title = Some(title.into());
        self
    }

    /// Set the chart description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.chart.meta.description = Some(desc.into());
        self
    }

    /// Set the X-axis label
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.chart.x_label = Some(label.into());
        self
    }

    /// Set the Y-axis label
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.chart.y_label = Some(label.into());
        self
    }

    pub fn grid(mut self, visible: bool) -> Self {
        self.chart.grid.visible = visible;
        self
    }

    pub fn grid_alpha(mut self, alpha: f32) -> Self {
        self.chart.grid.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn pan(mut self, enabled: bool) -> Self {
        self.chart.interaction.pan = enabled;
        self
    }

    pub fn zoom(mut self, enabled: bool) -> Self {
        self.chart.interaction.zoom = enabled;
        self
    }
}

// Allow passing &Style into the `impl Into<Option<Style>>` slot.
// (Do NOT implement From<Style> for Option<Style> — std already has it.)
impl From<&Style> for Option<Style> {
    #[inline]
    fn from(s: &Style) -> Self {
        Some(*s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> StageSeries {
        StageSeries::new(vec![58.7, 10.39], 5.0).unwrap()
    }

    #[test]
    fn test_builder_assembles_charts_in_order() {
        let fig = figure()
            .step_chart(|c| c.series(sample_series()).title("first"))
            .step_chart(|c| c.series(sample_series()).title("second"))
            .build();
        assert_eq!(fig.charts.len(), 2);
        assert_eq!(fig.charts[0].meta.title.as_deref(), Some("first"));
        assert_eq!(fig.charts[1].meta.title.as_deref(), Some("second"));
    }

    #[test]
    fn test_axis_labels_and_grid_plumbed_through() {
        let fig = figure()
            .step_chart(|c| {
                c.series(sample_series())
                    .x_label("Time (s)")
                    .y_label("Current (mA)")
                    .grid_alpha(0.6)
            })
            .build();
        let chart = &fig.charts[0];
        assert_eq!(chart.x_label.as_deref(), Some("Time (s)"));
        assert_eq!(chart.y_label.as_deref(), Some("Current (mA)"));
        assert!(chart.grid.visible);
        assert_eq!(chart.grid.alpha, 0.6);
    }

    #[test]
    fn test_step_with_style_reference_overrides_line_only() {
        let amber = Style::default().rgb(1.0, 0.65, 0.1);
        let fig = figure()
            .step_chart(|c| c.step(sample_series(), &amber))
            .build();
        let trace = &fig.charts[0].traces[0];
        assert_eq!(trace.line_style.color, amber.color);
        assert_eq!(trace.marker_style.color, Color::RED);
    }

    #[test]
    fn test_columns_clamped_to_at_least_one() {
        let fig = figure().columns(0).build();
        assert_eq!(fig.columns, Some(1));
    }

    #[test]
    fn test_grid_can_be_disabled() {
        let fig = figure()
            .step_chart(|c| c.series(sample_series()).grid(false))
            .build();
        assert!(!fig.charts[0].grid.visible);
    }

    #[test]
    fn test_figure_serializes_with_stable_field_names() {
        let fig = figure()
            .step_chart(|c| c.trace(StepTrace::new(sample_series()).label("Measurements")))
            .build();
        let json = serde_json::to_string(&fig).unwrap();
        assert!(json.contains("\"charts\""));
        assert!(json.contains("\"readings\""));
        assert!(json.contains("\"stage_duration\""));
        assert!(json.contains("\"Measurements\""));
    }

    #[test]
    fn test_default_interaction_allows_pan_and_zoom() {
        let fig = figure().step_chart(|c| c.series(sample_series())).build();
        let chart = &fig.charts[0];
        assert!(chart.interaction.pan);
        assert!(chart.interaction.zoom);

        let fixed = figure()
            .step_chart(|c| c.series(sample_series()).pan(false).zoom(false))
            .build();
        assert!(!fixed.charts[0].interaction.pan);
        assert!(!fixed.charts[0].interaction.zoom);
    }
}
