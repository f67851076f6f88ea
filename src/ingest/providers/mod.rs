pub mod phivolcs;
