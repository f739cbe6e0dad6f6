mod test_host_disconnect_notifies_joiner;
