mod test_duplicate_handshake;
mod test_end_to_end_transfer;
