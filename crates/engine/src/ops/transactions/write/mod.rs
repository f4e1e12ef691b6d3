mod cancel;
mod create;
mod payment;
mod update;
