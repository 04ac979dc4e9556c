use gradino::core::{Color, Style};
use gradino::prelude::*;

fn main() -> gradino::Result<()> {
    // Same firmware sequence measured on two board revisions. Rev B carries
    // a linear regulator that never fully shuts off, so every sleep stage
    // sits a little higher.
    let rev_a = vec![58.7, 10.39, 58.7, 6.06, 58.7, 4.77, 58.7, 4.77, 10.39];
    let rev_b = vec![61.2, 12.05, 61.2, 7.4, 61.2, 5.9, 61.2, 5.62, 12.05];

    let series_a = StageSeries::new(rev_a, 5.0)?;
    let series_b = StageSeries::new(rev_b, 5.0)?;

    let amber = Style::default().rgb(1.0, 0.65, 0.1);

    figure()
        .background_color(Color::rgba(0.04, 0.04, 0.08, 1.0))
        .columns(2)
        // Left: both revisions overlaid, rev A filled down to the baseline
        .step_chart(|chart| {
            chart
                .trace(StepTrace::new(series_a).label("Rev A").fill(0.15))
                .trace(
                    StepTrace::new(series_b.clone())
                        .label("Rev B")
                        .line_style(Style::default().rgb(0.2, 0.8, 0.4))
                        .marker_style(Style::default().rgb(0.2, 0.8, 0.4).size(4.0)),
                )
                .title("Supply current by board revision")
                .x_label("Time (s)")
                .y_label("Current (mA)")
        })
        // Right: rev B alone in amber, grid off
        .step_chart(|chart| {
            chart
                .step(series_b, &amber)
                .title("Rev B only")
                .description("Regulator quiescent current dominates the sleep stages")
                .x_label("Time (s)")
                .y_label("Current (mA)")
                .grid(false)
        })
        .show();

    Ok(())
}
