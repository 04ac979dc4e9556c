use crate::prelude::components::ChartId;
use crate::{GradinoError, Result};
use bevy_math::Vec2;
use error_stack::Report;
use serde::{Deserialize, Serialize};

/// Common metadata for a chart
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChartMeta {
    /// Title displayed at the top of the chart
    pub title: Option<String>,
    /// Optional description displayed below the title
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
    pub const fn with_a(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
}

impl From<Color> for bevy::prelude::Color {
    #[inline]
    fn from(c: Color) -> Self {
        bevy::prelude::Color::linear_rgba(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Style {
    pub color: Color,
    pub size: f32,    // line width / marker diameter
    pub opacity: f32, // multiplied into alpha
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 2.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    #[inline]
    pub const fn color(mut self, c: Color) -> Self {
        self.color = c;
        self
    }

    #[inline]
    pub const fn rgb(self, r: f32, g: f32, b: f32) -> Self {
        self.color(Color::rgb(r, g, b))
    }

    #[inline]
    pub const fn rgba(self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.color(Color::rgba(r, g, b, a))
    }

    #[inline]
    pub const fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Which mouse interactions a chart responds to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Interaction {
    pub pan: bool,
    pub zoom: bool,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            pan: true,
            zoom: true,
        }
    }
}

/// Dashed background grid, drawn at the axis tick positions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridStyle {
    pub visible: bool,
    pub alpha: f32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            visible: true,
            alpha: 0.6,
        }
    }
}

/// An ordered run of current readings, one per stage, each held for the same
/// fixed duration. The first stage starts at t = 0.
///
/// Invariants are enforced at construction: at least one reading, a positive
/// finite stage duration, and (when present) one label per stage. Everything
/// derived from a series can therefore assume a well-formed input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageSeries {
    readings: Vec<f32>,
    stage_duration: f32,
    stage_labels: Option<Vec<String>>,
}

impl StageSeries {
    pub fn new(readings: Vec<f32>, stage_duration: f32) -> Result<Self> {
        if readings.is_empty() {
            return Err(Report::new(GradinoError::EmptySeries));
        }
        if !(stage_duration.is_finite() && stage_duration > 0.0) {
            return Err(Report::new(GradinoError::InvalidDuration)
                .attach_printable(format!("stage duration: {stage_duration}")));
        }
        Ok(Self {
            readings,
            stage_duration,
            stage_labels: None,
        })
    }

    /// Like [`StageSeries::new`], with one label per stage for hover readouts.
    pub fn with_labels<S: Into<String>>(
        readings: Vec<f32>,
        stage_duration: f32,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let mut series = Self::new(readings, stage_duration)?;
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != series.readings.len() {
            return Err(Report::new(GradinoError::LabelCountMismatch).attach_printable(format!(
                "{} labels for {} readings",
                labels.len(),
                series.readings.len()
            )));
        }
        series.stage_labels = Some(labels);
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[f32] {
        &self.readings
    }

    pub fn stage_duration(&self) -> f32 {
        self.stage_duration
    }

    pub fn stage_labels(&self) -> Option<&[String]> {
        self.stage_labels.as_deref()
    }

    /// Label of one stage, if labels were supplied.
    pub fn label(&self, stage: usize) -> Option<&str> {
        self.stage_labels
            .as_ref()
            .and_then(|l| l.get(stage))
            .map(String::as_str)
    }

    /// Time spanned by the whole run: number of stages times stage duration.
    pub fn total_duration(&self) -> f32 {
        self.readings.len() as f32 * self.stage_duration
    }

    /// The staircase polyline. Each stage contributes two points, one at its
    /// start and one at its end, both at the stage's reading. The value holds
    /// until the stage boundary and changes there instantaneously, so
    /// consecutive stages are joined by a vertical riser.
    pub fn step_path(&self) -> Vec<Vec2> {
        let d = self.stage_duration;
        let mut path = Vec::with_capacity(self.readings.len() * 2);
        for (i, &v) in self.readings.iter().enumerate() {
            let t0 = i as f32 * d;
            path.push(Vec2::new(t0, v));
            path.push(Vec2::new(t0 + d, v));
        }
        path
    }

    /// One marker per stage at the instant the reading was taken, halfway
    /// through the stage.
    pub fn midpoints(&self) -> Vec<Vec2> {
        let d = self.stage_duration;
        self.readings
            .iter()
            .enumerate()
            .map(|(i, &v)| Vec2::new((i as f32 + 0.5) * d, v))
            .collect()
    }
}

/// One step series plus its styling inside a chart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepTrace {
    pub series: StageSeries,
    pub line_style: Style,
    pub marker_style: Style,
    /// Legend entry for the midpoint markers. Traces without a label are
    /// left out of the legend.
    pub label: Option<String>,
    /// Alpha of the area between the staircase and y = 0, if filled.
    pub fill_opacity: Option<f32>,
}

impl StepTrace {
    pub fn new(series: StageSeries) -> Self {
        Self {
            series,
            line_style: Style {
                color: Color::BLUE,
                size: 2.0,
                opacity: 1.0,
            },
            marker_style: Style {
                color: Color::RED,
                size: 4.0,
                opacity: 1.0,
            },
            label: None,
            fill_opacity: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn line_style(mut self, style: Style) -> Self {
        self.line_style = style;
        self
    }

    pub fn marker_style(mut self, style: Style) -> Self {
        self.marker_style = style;
        self
    }

    pub fn fill(mut self, opacity: f32) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepChart {
    pub id: ChartId,
    pub meta: ChartMeta,
    pub traces: Vec<StepTrace>,
    pub interaction: Interaction,
    pub grid: GridStyle,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl StepChart {
    pub fn new() -> Self {
        Self {
            id: ChartId::new(),
            meta: ChartMeta::default(),
            traces: vec![],
            interaction: Interaction::default(),
            grid: GridStyle::default(),
            x_label: None,
            y_label: None,
        }
    }

    pub fn with_trace(mut self, trace: StepTrace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Data-space bounding box over every trace's step path. Filled traces
    /// extend the box down to the y = 0 baseline.
    pub fn bounds(&self) -> Option<([f32; 2], [f32; 2])> {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        let mut any = false;
        for t in &self.traces {
            for p in t.series.step_path() {
                if !p.x.is_finite() || !p.y.is_finite() {
                    continue;
                }
                min[0] = min[0].min(p.x);
                min[1] = min[1].min(p.y);
                max[0] = max[0].max(p.x);
                max[1] = max[1].max(p.y);
                any = true;
            }
            if t.fill_opacity.is_some() {
                min[1] = min[1].min(0.0);
                max[1] = max[1].max(0.0);
            }
        }
        any.then_some((min, max))
    }
}

impl Default for StepChart {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Figure {
    pub background: Color,
    pub charts: Vec<StepChart>,
    /// Number of columns per row (default: auto based on chart count)
    pub columns: Option<usize>,
}

impl Default for Figure {
    fn default() -> Self {
        Self {
            background: Color::rgba(0.05, 0.05, 0.09, 1.0),
            charts: vec![],
            columns: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep_test_readings() -> Vec<f32> {
        vec![58.7, 10.39, 58.7, 6.06, 58.7, 4.77, 58.7, 4.77, 10.39]
    }

    #[test]
    fn test_step_path_has_two_points_per_stage() {
        let series = StageSeries::new(sleep_test_readings(), 5.0).unwrap();
        assert_eq!(series.step_path().len(), 2 * series.len());
    }

    #[test]
    fn test_step_path_pairs_carry_stage_value() {
        let readings = sleep_test_readings();
        let series = StageSeries::new(readings.clone(), 5.0).unwrap();
        let path = series.step_path();
        for (i, &v) in readings.iter().enumerate() {
            assert_eq!(path[2 * i].y, v);
            assert_eq!(path[2 * i + 1].y, v);
        }
    }

    #[test]
    fn test_step_path_times_for_two_stages() {
        let series = StageSeries::new(vec![58.7, 10.39], 5.0).unwrap();
        let path = series.step_path();
        let times: Vec<f32> = path.iter().map(|p| p.x).collect();
        let values: Vec<f32> = path.iter().map(|p| p.y).collect();
        assert_eq!(times, vec![0.0, 5.0, 5.0, 10.0]);
        assert_eq!(values, vec![58.7, 58.7, 10.39, 10.39]);
    }

    #[test]
    fn test_midpoints_centered_in_each_stage() {
        let series = StageSeries::new(vec![58.7, 10.39], 5.0).unwrap();
        let mids = series.midpoints();
        assert_eq!(mids.len(), 2);
        assert_eq!(mids[0], Vec2::new(2.5, 58.7));
        assert_eq!(mids[1], Vec2::new(7.5, 10.39));
    }

    #[test]
    fn test_midpoint_x_positions_for_all_stages() {
        let series = StageSeries::new(sleep_test_readings(), 5.0).unwrap();
        for (i, p) in series.midpoints().iter().enumerate() {
            assert_eq!(p.x, (i as f32 + 0.5) * 5.0);
        }
    }

    #[test]
    fn test_total_duration_spans_all_stages() {
        let series = StageSeries::new(sleep_test_readings(), 5.0).unwrap();
        assert_eq!(series.len(), 9);
        assert_eq!(series.total_duration(), 45.0);
        let path = series.step_path();
        assert_eq!(path.first().unwrap().x, 0.0);
        assert_eq!(path.last().unwrap().x, 45.0);
    }

    #[test]
    fn test_single_reading_yields_one_flat_segment() {
        let series = StageSeries::new(vec![3.3], 5.0).unwrap();
        let path = series.step_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0], Vec2::new(0.0, 3.3));
        assert_eq!(path[1], Vec2::new(5.0, 3.3));
        assert_eq!(series.midpoints(), vec![Vec2::new(2.5, 3.3)]);
    }

    #[test]
    fn test_empty_readings_rejected() {
        let err = StageSeries::new(vec![], 5.0).unwrap_err();
        assert!(matches!(err.current_context(), GradinoError::EmptySeries));
    }

    #[test]
    fn test_nonpositive_duration_rejected() {
        for d in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = StageSeries::new(vec![1.0], d).unwrap_err();
            assert!(matches!(
                err.current_context(),
                GradinoError::InvalidDuration
            ));
        }
    }

    #[test]
    fn test_label_count_must_match_readings() {
        let err = StageSeries::with_labels(vec![1.0, 2.0], 5.0, ["only one"]).unwrap_err();
        assert!(matches!(
            err.current_context(),
            GradinoError::LabelCountMismatch
        ));
    }

    #[test]
    fn test_stage_label_lookup() {
        let series = StageSeries::with_labels(vec![58.7, 4.77], 5.0, ["On", "Power-down"]).unwrap();
        assert_eq!(series.label(0), Some("On"));
        assert_eq!(series.label(1), Some("Power-down"));
        assert_eq!(series.label(2), None);

        let unlabeled = StageSeries::new(vec![58.7], 5.0).unwrap();
        assert_eq!(unlabeled.label(0), None);
    }

    #[test]
    fn test_duplicate_readings_preserved_in_order() {
        let series = StageSeries::new(vec![58.7, 58.7, 58.7], 2.0).unwrap();
        let path = series.step_path();
        assert_eq!(path.len(), 6);
        assert!(path.iter().all(|p| p.y == 58.7));
        let times: Vec<f32> = path.iter().map(|p| p.x).collect();
        assert_eq!(times, vec![0.0, 2.0, 2.0, 4.0, 4.0, 6.0]);
    }

    #[test]
    fn test_trace_defaults() {
        let trace = StepTrace::new(StageSeries::new(vec![1.0], 1.0).unwrap());
        assert_eq!(trace.line_style.color, Color::BLUE);
        assert_eq!(trace.line_style.size, 2.0);
        assert_eq!(trace.marker_style.color, Color::RED);
        assert!(trace.label.is_none());
        assert!(trace.fill_opacity.is_none());
    }

    #[test]
    fn test_chart_bounds_cover_step_path() {
        let series = StageSeries::new(sleep_test_readings(), 5.0).unwrap();
        let chart = StepChart::new().with_trace(StepTrace::new(series));
        let (min, max) = chart.bounds().unwrap();
        assert_eq!(min, [0.0, 4.77]);
        assert_eq!(max, [45.0, 58.7]);
    }

    #[test]
    fn test_filled_trace_extends_bounds_to_baseline() {
        let series = StageSeries::new(vec![10.0, 20.0], 5.0).unwrap();
        let chart = StepChart::new().with_trace(StepTrace::new(series).fill(0.2));
        let (min, max) = chart.bounds().unwrap();
        assert_eq!(min[1], 0.0);
        assert_eq!(max[1], 20.0);
    }

    #[test]
    fn test_empty_chart_has_no_bounds() {
        assert!(StepChart::new().bounds().is_none());
    }

    #[test]
    fn test_grid_defaults_dashed_semi_transparent() {
        let grid = GridStyle::default();
        assert!(grid.visible);
        assert_eq!(grid.alpha, 0.6);
    }
}
