use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration,
};
use intersection_sim::control_system::traffic_light::{LightPhase, TrafficLight};
use std::time::Duration;

fn bench_phase_snapshot(c: &mut Criterion) {
    let light = TrafficLight::with_cycle_millis(3_600_000, 3_600_000);

    let mut group = c.benchmark_group("traffic_light");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    group.bench_function("current_phase", |b| {
        b.iter(|| {
            black_box(light.current_phase());
        });
    });

    group.bench_function("wait_for_green_fast_path", |b| {
        light.force_phase(LightPhase::Green);
        b.iter(|| {
            light.wait_for_green();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_phase_snapshot);
criterion_main!(benches);
