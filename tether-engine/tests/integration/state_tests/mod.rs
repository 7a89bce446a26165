mod test_removal_ordering;
mod test_shutdown;
mod test_track_lifecycle;
