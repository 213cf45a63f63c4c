// Domain types exchanged with the extraction service and the UI.

pub mod ad;
