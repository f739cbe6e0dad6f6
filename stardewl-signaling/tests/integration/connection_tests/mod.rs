mod test_second_host_is_rejected;
mod test_single_peer_joins_room;
mod test_unknown_room_is_rejected;
