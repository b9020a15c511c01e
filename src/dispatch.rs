use crate::AssetError::*;
use crate::AssetResult;

/// Which of the five container flavors a raw input blob is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
	/// Compressed tabular blob, first byte `0x5D`.
	Csv,

	/// CSV preceded by a 68-byte `"Sig:"`-prefixed signature.
	SignedCsv,

	/// Outer "SC" envelope with an inner tagged-chunk stream.
	Sc,

	/// Standalone KTX1/KTX2 texture.
	Ktx,

	/// Standalone SCTX texture.
	Sctx,
}


/// Classifies a raw file blob from its leading bytes. See SPEC_FULL.md §4.2.
pub struct Dispatcher;

impl Dispatcher {
	pub fn classify(data: &[u8]) -> AssetResult<ContainerKind> {
		if data.first() == Some(&0x5Du8) {
			return Ok(ContainerKind::Csv);
		}

		if data.get(0..2) == Some(b"SC") {
			return Ok(ContainerKind::Sc);
		}

		if data.get(0..4) == Some(b"Sig:") {
			return Ok(ContainerKind::SignedCsv);
		}

		if data.get(0..5) == Some(&[0xABu8, b'K', b'T', b'X', b' ']) {
			return Ok(ContainerKind::Ktx);
		}

		if data.get(8..12) == Some(b"SCTX") {
			return Ok(ContainerKind::Sctx);
		}

		Err(UnknownContainer)
	}
}


#[test]
fn classifies_csv() {
	let data = [0x5Du8, 0, 0, 0];
	assert_eq!(Dispatcher::classify(&data).unwrap(), ContainerKind::Csv);
}


#[test]
fn classifies_signed_csv() {
	// The embedded 0x5D at the end of the signature must not cause this to
	// be misread as a generic CSV; only the leading byte is the CSV probe.
	let mut data = b"Sig:".to_vec();
	data.extend([0u8; 64]);
	data.push(0x5D);
	assert_eq!(Dispatcher::classify(&data).unwrap(), ContainerKind::SignedCsv);
}


#[test]
fn classifies_sc() {
	let data = b"SC\x00\x01\x00\x00\x00\x10";
	assert_eq!(Dispatcher::classify(data).unwrap(), ContainerKind::Sc);
}


#[test]
fn classifies_ktx() {
	let mut data = vec![0xABu8, b'K', b'T', b'X', b' '];
	data.extend([0u8; 8]);
	assert_eq!(Dispatcher::classify(&data).unwrap(), ContainerKind::Ktx);
}


#[test]
fn classifies_sctx() {
	let mut data = vec![0u8; 8];
	data.extend(b"SCTX");
	assert_eq!(Dispatcher::classify(&data).unwrap(), ContainerKind::Sctx);
}


#[test]
fn rejects_unknown_prefix() {
	let data = [0x00u8; 16];
	assert_eq!(Dispatcher::classify(&data).unwrap_err(), UnknownContainer);
}


#[test]
fn rejects_short_input() {
	let data = [0x00u8; 2];
	assert_eq!(Dispatcher::classify(&data).unwrap_err(), UnknownContainer);
}
