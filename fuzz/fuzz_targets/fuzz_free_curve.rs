#![no_main]

use glam::DVec2;
use libfuzzer_sys::fuzz_target;
use track_network_engine::Tolerance;
use track_network_engine::geometry::{free_curve, same_heading};

fuzz_target!(|data: [f64; 6]| {
    let [x1, y1, h1, x2, y2, h2] = data;
    if data.iter().any(|v| !v.is_finite() || v.abs() > 1.0e6) {
        return;
    }
    let tolerance = Tolerance::default();
    let (p1, p2) = (DVec2::new(x1, y1), DVec2::new(x2, y2));
    let Some(curve) = free_curve(p1, h1, p2, h2, &tolerance) else {
        return;
    };

    // Ein gelieferter Doppelbogen trifft beide Enden mit der geforderten Richtung
    let scale = 1.0 + p1.abs().max_element().max(p2.abs().max_element());
    assert!(curve.first.start_point().distance(p1) <= 1e-3 * scale);
    assert!(curve.second.end_point().distance(p2) <= 1e-3 * scale);
    assert!(curve.first.end_point().distance(curve.second.start_point()) <= 1e-3 * scale);
    assert!(same_heading(curve.first.start_heading(), h1, 1e-6));
    assert!(curve.length().is_finite());
});
