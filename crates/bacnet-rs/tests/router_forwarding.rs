// crates/bacnet-rs/tests/router_forwarding.rs
//! End-to-end coverage of the router core across the full encode/decode
//! boundary: a caller only ever gets to poke at [`bacnet_rs::router::Router`]
//! through `handle_inbound(port, bytes)`, so these tests build real wire
//! bytes with the public NPDU codec rather than reaching into the router's
//! internals.

use bacnet_rs::common::{Address, Priority};
use bacnet_rs::npdu::{decode_npdu, encode_npdu, Npdu};
use bacnet_rs::router::{PortInfo, Router, RouterAction};

fn two_port_router() -> Router {
    Router::new(
        vec![
            PortInfo { id: 10, network: 1000 },
            PortInfo { id: 20, network: 2000 },
        ],
        8,
    )
}

#[test]
fn a_unicast_request_crosses_the_router_and_keeps_its_apdu_intact() {
    let mut router = two_port_router();

    let mut dest = Address::empty();
    dest.net = 2000;
    dest.set_adr(&[0x07]);
    let npdu = Npdu::new_data(Some(dest), true, Priority::Normal);

    let mut buf = [0u8; 64];
    let n = encode_npdu(&mut buf, &npdu).unwrap();
    let mut frame = buf[..n].to_vec();
    let apdu = [0x00, 0x01, 0x02, 0x03];
    frame.extend_from_slice(&apdu);

    let actions = router.handle_inbound(10, &frame).unwrap();
    assert_eq!(actions.len(), 1);
    let RouterAction::SendOn { port_id, frame: forwarded } = &actions[0] else {
        panic!("expected the frame to be forwarded, got {:?}", actions[0]);
    };
    assert_eq!(*port_id, 20);

    let (forwarded_npdu, consumed) = decode_npdu(forwarded).unwrap();
    assert_eq!(&forwarded[consumed..], &apdu);
    assert_eq!(forwarded_npdu.destination.unwrap().net, 2000);
    // Crossing one router hop: the source network is now stamped so a reply
    // can find its way back (Clause 6.2).
    assert_eq!(forwarded_npdu.source.unwrap().net, 1000);
    assert!(forwarded_npdu.hop_count.unwrap() < npdu.hop_count.unwrap_or(255));
}

#[test]
fn a_global_broadcast_is_both_delivered_locally_and_forwarded() {
    let mut router = two_port_router();
    let npdu = Npdu::new_data(Some(Address::global_broadcast()), false, Priority::Normal);
    let mut buf = [0u8; 32];
    let n = encode_npdu(&mut buf, &npdu).unwrap();
    let mut frame = buf[..n].to_vec();
    frame.push(0xAA);

    let actions = router.handle_inbound(10, &frame).unwrap();
    assert_eq!(actions.len(), 2);
    assert!(matches!(&actions[0], RouterAction::Deliver { apdu, .. } if apdu == &vec![0xAA]));
    assert!(matches!(&actions[1], RouterAction::SendOn { port_id: 20, .. }));
}

#[test]
fn an_unknown_network_triggers_discovery_instead_of_a_silent_drop() {
    let mut router = two_port_router();
    let mut dest = Address::empty();
    dest.net = 55555;
    let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
    let mut buf = [0u8; 32];
    let n = encode_npdu(&mut buf, &npdu).unwrap();

    let actions = router.handle_inbound(10, &buf[..n]).unwrap();
    assert_eq!(actions, vec![RouterAction::DiscoverRoute { network: 55555 }]);
}

#[test]
fn a_malformed_npdu_is_rejected_rather_than_routed() {
    let mut router = two_port_router();
    let garbage = [0xFFu8; 3];
    assert!(router.handle_inbound(10, &garbage).is_err());
}
