use gradino::prelude::*;

fn main() -> gradino::Result<()> {
    // Current at the supply rail (mA), one reading per 5 s stage. Awake
    // stages with all six LEDs lit alternate with LEDs-off and the sleep
    // modes the firmware cycles through.
    let readings = vec![58.7, 10.39, 58.7, 6.06, 58.7, 4.77, 58.7, 4.77, 10.39];
    let labels = [
        "Awake, LEDs on",
        "Awake, LEDs off",
        "Awake, LEDs on",
        "ADC noise reduction",
        "Awake, LEDs on",
        "Power-save",
        "Awake, LEDs on",
        "Power-down",
        "Awake, LEDs off",
    ];

    let series = StageSeries::with_labels(readings, 5.0, labels)?;

    figure()
        .step_chart(|chart| {
            chart
                .trace(StepTrace::new(series).label("Measurements"))
                .title("Sleep-mode power consumption - ATmega328P (Arduino)")
                .description("5 s per stage, hand-read from a multimeter")
                .x_label("Time (s)")
                .y_label("Current (mA)")
        })
        .show();

    Ok(())
}
