//! CBOR responses carried over chained APDU exchanges

mod common;

use common::{AuthenticatorTransport, init_tracing};
use keywire_apdu_core::prelude::*;
use keywire_cbor::{CborMap, Error as CborError, Value, ValueKind, to_vec};

const CTAP_CBOR_MSG: u8 = 0x10;
const GET_INFO: u8 = 0x04;

fn get_info_response() -> Value {
    [
        (1, Value::from(vec![Value::from("U2F_V2"), Value::from("FIDO_2_0")])),
        (2, Value::from(vec![Value::from("hmac-secret")])),
        (3, Value::from(vec![0xcbu8; 16])),
        (
            4,
            [
                (1, Value::from(true)),
                (2, Value::from(false)),
                (3, Value::from(true)),
            ]
            .into_iter()
            .collect(),
        ),
        (5, Value::from(1200_i64)),
        // Padding so the reply spans several GET RESPONSE rounds
        (6, Value::from(vec![0x00u8; 600])),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_chained_response_decodes_as_map() {
    init_tracing();

    let expected = get_info_response();
    let transport = AuthenticatorTransport::new(0x00, &to_vec(&expected).unwrap(), 0x80);
    let mut executor = CardExecutor::new(transport);

    let command = Command::new_with_data(0x80, CTAP_CBOR_MSG, 0x00, 0x00, vec![GET_INFO]);
    let response = executor.transmit(&command).unwrap();
    assert!(response.is_success());

    let (ctap_status, body) = response.payload().split_first().unwrap();
    assert_eq!(*ctap_status, 0x00);

    let info = CborMap::from_slice(body).unwrap();
    assert_eq!(info.read_array(1).unwrap().len(), 2);
    assert_eq!(info.read_array(1).unwrap()[1].as_text(), Some("FIDO_2_0"));
    assert_eq!(info.read_byte_string(3).unwrap(), &[0xcb; 16]);
    assert!(info.read_map(4).unwrap().read_bool(1).unwrap());
    assert_eq!(info.read_int64(5).unwrap(), 1200);
    assert_eq!(
        info.read_text_string(5),
        Err(CborError::TypeMismatch {
            key: 5,
            expected: ValueKind::TextString,
            found: ValueKind::Integer,
        })
    );
    assert_eq!(Value::from(info), expected);

    // One command plus one GET RESPONSE per further 128 byte chunk
    let commands = &executor.transport().commands;
    let body_len = 1 + to_vec(&expected).unwrap().len();
    assert_eq!(commands.len(), body_len.div_ceil(0x80));
    assert!(commands[1..].iter().all(|c| c.ins == 0xC0));
    assert_eq!(commands[1].le, Some(0x80));
}

#[test]
fn test_truncated_body_is_not_a_map() {
    init_tracing();

    let bytes = to_vec(&get_info_response()).unwrap();
    let transport = AuthenticatorTransport::new(0x00, &bytes[..bytes.len() - 10], 0xF0);
    let mut executor = CardExecutor::new(transport);

    let response = executor
        .transmit(&Command::new_with_data(0x80, CTAP_CBOR_MSG, 0x00, 0x00, vec![GET_INFO]))
        .unwrap();

    let err = CborMap::from_slice(&response.payload()[1..]).unwrap_err();
    assert!(matches!(err, CborError::UnexpectedEof(_)));
    assert!(!err.is_access_error());
}
