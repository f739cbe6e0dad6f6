mod test_multiple_peers_join;
