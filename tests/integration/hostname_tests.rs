//! Hostname negotiation against the fake network.

use slotlogger::app::hostname::uniqueify;
use slotlogger::app::ports::NetworkPort;
use slotlogger::error::SessionError;
use slotlogger::track::palette;

use crate::mock_hw::{MockNet, OTHER_IP, OWN_IP};

fn associated(net: MockNet) -> MockNet {
    let mut net = net.with_network("TrackNet", "password1");
    net.associate("TrackNet", "password1").unwrap();
    net.calls.clear();
    net
}

#[test]
fn free_name_is_returned_unchanged() {
    let mut net = associated(MockNet::new());
    let p = palette(4).unwrap();
    assert_eq!(uniqueify("logger-red", p, &mut net), Ok("logger-red".into()));
    assert_eq!(net.resolves(), ["logger-red"]);
}

#[test]
fn name_held_by_us_is_kept() {
    let mut net = associated(MockNet::new().with_host("logger-red", OWN_IP));
    let p = palette(4).unwrap();
    assert_eq!(uniqueify("logger-red", p, &mut net), Ok("logger-red".into()));
    // Same answer the second time round.
    assert_eq!(uniqueify("logger-red", p, &mut net), Ok("logger-red".into()));
}

#[test]
fn taken_colour_moves_to_the_next_palette_entry() {
    let mut net = associated(MockNet::new().with_host("logger-green", OTHER_IP));
    let p = palette(6).unwrap();
    assert_eq!(uniqueify("logger-green", p, &mut net), Ok("logger-blue".into()));
    assert_eq!(net.resolves(), ["logger-green", "logger-blue"]);
}

#[test]
fn colour_walk_follows_palette_order() {
    let net = MockNet::new()
        .with_host("logger-blue", OTHER_IP)
        .with_host("logger-black", OTHER_IP)
        .with_host("logger-red", OTHER_IP);
    let mut net = associated(net);
    let p = palette(4).unwrap();

    assert_eq!(uniqueify("logger-blue", p, &mut net), Ok("logger-white".into()));
    assert_eq!(
        net.resolves(),
        ["logger-blue", "logger-black", "logger-red", "logger-white"]
    );
}

#[test]
fn failed_probe_counts_as_taken() {
    let mut net = associated(MockNet::new());
    net.failing_probes.push("logger-white".into());
    let p = palette(4).unwrap();
    assert_eq!(uniqueify("logger-white", p, &mut net), Ok("logger-blue".into()));
}

#[test]
fn gives_up_after_one_probe_per_colour() {
    let p = palette(8).unwrap();
    let mut net = MockNet::new();
    for colour in p {
        net = net.with_host(&format!("logger-{colour}"), OTHER_IP);
    }
    let mut net = associated(net);

    assert_eq!(
        uniqueify("logger-black", p, &mut net),
        Err(SessionError::NoAvailableHostname)
    );
    assert_eq!(net.resolves().len(), p.len());
}
