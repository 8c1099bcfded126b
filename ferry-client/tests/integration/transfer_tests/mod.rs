mod test_pause_and_resume;
mod test_recipient_leaves_mid_transfer;
