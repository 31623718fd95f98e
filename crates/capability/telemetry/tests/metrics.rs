use park_telemetry::{metrics, record_command_dispatched, record_command_latency_ms};

#[test]
fn global_counters_only_grow() {
    let before = metrics().snapshot();
    record_command_dispatched();
    record_command_latency_ms(12);
    let after = metrics().snapshot();
    assert!(after.commands_dispatched >= before.commands_dispatched + 1);
    assert!(after.command_latency_ms_total >= before.command_latency_ms_total + 12);
    assert!(after.command_latency_ms_count >= before.command_latency_ms_count + 1);
}
