use sonolink_core::{design, FilterFamily, FilterSpec, LinkParameters, ModemError};

const FS: u32 = 20000;

fn channel_bandpass() -> FilterSpec {
    FilterSpec::bandpass([2425.0, 2575.0], [2300.0, 2700.0], 1.0, 40.0, FS)
}

fn baseband_lowpass() -> FilterSpec {
    FilterSpec::lowpass(100.0, 500.0, 1.0, 40.0, FS)
}

#[test]
fn test_channel_bandpass_meets_template() {
    let filter = design(&channel_bandpass()).expect("bandpass design failed");

    let center = filter.magnitude_db(2500.0);
    assert!(center.abs() < 2.0, "center gain {:.2} dB", center);
    for edge in [2425.0, 2575.0] {
        let gain = filter.magnitude_db(edge);
        assert!(gain > -2.0, "passband edge {} Hz at {:.2} dB", edge, gain);
    }
    for edge in [2300.0, 2700.0] {
        let gain = filter.magnitude_db(edge);
        assert!(gain < -35.0, "stopband edge {} Hz at {:.2} dB", edge, gain);
    }
}

#[test]
fn test_baseband_lowpass_meets_template() {
    let filter = design(&baseband_lowpass()).expect("lowpass design failed");

    assert!(filter.magnitude_db(0.0).abs() < 0.01);
    let pass = filter.magnitude_db(100.0);
    assert!(pass.abs() < 2.0, "100 Hz at {:.2} dB", pass);
    let stop = filter.magnitude_db(500.0);
    assert!(stop < -35.0, "500 Hz at {:.2} dB", stop);
}

#[test]
fn test_chebyshev_meets_same_templates() {
    let bandpass = design(&channel_bandpass().with_family(FilterFamily::Chebyshev1)).unwrap();
    assert!(bandpass.magnitude_db(2500.0).abs() < 2.0);
    assert!(bandpass.magnitude_db(2300.0) < -35.0);
    assert!(bandpass.magnitude_db(2700.0) < -35.0);

    let lowpass = design(&baseband_lowpass().with_family(FilterFamily::Chebyshev1)).unwrap();
    assert!(lowpass.magnitude_db(100.0).abs() < 2.0);
    assert!(lowpass.magnitude_db(500.0) < -35.0);
}

#[test]
fn test_chebyshev_needs_no_more_sections_than_butterworth() {
    for spec in [channel_bandpass(), baseband_lowpass()] {
        let butter = design(&spec).unwrap();
        let cheby = design(&spec.with_family(FilterFamily::Chebyshev1)).unwrap();
        assert!(cheby.sections().len() <= butter.sections().len());
    }
}

#[test]
fn test_all_poles_inside_unit_circle() {
    let specs = [
        channel_bandpass(),
        baseband_lowpass(),
        channel_bandpass().with_family(FilterFamily::Chebyshev1),
        baseband_lowpass().with_family(FilterFamily::Chebyshev1),
        FilterSpec::lowpass(3000.0, 6000.0, 0.5, 60.0, 44100),
    ];
    for spec in specs {
        let filter = design(&spec).unwrap();
        assert!(filter.is_stable());
        for pole in filter.poles() {
            assert!(pole.norm() < 1.0, "pole {} for {:?}", pole, spec.band);
        }
    }
}

#[test]
fn test_realization_carries_template_rate() {
    let filter = design(&FilterSpec::lowpass(100.0, 500.0, 1.0, 40.0, 8000)).unwrap();
    assert_eq!(filter.sample_rate(), 8000);
}

#[test]
fn test_default_link_templates_are_feasible() {
    let link = LinkParameters::default();
    assert!(design(&link.bandpass).is_ok());
    assert!(design(&link.lowpass).is_ok());
}

#[test]
fn test_infeasible_templates() {
    let cases = [
        // stopband inside passband
        FilterSpec::bandpass([2425.0, 2575.0], [2450.0, 2700.0], 1.0, 40.0, FS),
        // passband edge above stopband edge
        FilterSpec::lowpass(600.0, 500.0, 1.0, 40.0, FS),
        // ripple not below attenuation
        FilterSpec::lowpass(100.0, 500.0, 40.0, 40.0, FS),
        // non-positive ripple
        FilterSpec::lowpass(100.0, 500.0, 0.0, 40.0, FS),
    ];
    for spec in cases {
        assert!(
            matches!(design(&spec), Err(ModemError::SpecInfeasible(_))),
            "{:?} should be infeasible",
            spec
        );
    }
}
